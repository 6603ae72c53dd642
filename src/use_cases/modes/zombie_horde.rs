use glam::Vec3;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::domain::occupancy::pick_spawn_slot;
use crate::domain::ports::ActorId;
use crate::domain::tuning::ZombieHordeTuning;
use crate::domain::{Outcome, Pose, RoutingTable};
use crate::use_cases::bot::{BotSpec, Movement};
use crate::use_cases::session::{ModePolicy, SessionCtx};
use crate::use_cases::sync::read;
use crate::use_cases::types::{FinishedBot, GameModeKind, SessionEvent};

const TITLE: &str = "The zombies are coming for your brains!";
const TITLE_OFFSET: Vec3 = Vec3::new(0.0, 0.5, 0.0);
const HP_OFFSET: Vec3 = Vec3::new(0.0, -0.5, 0.0);

fn hp_text(hp: i32) -> String {
    if hp > 0 {
        format!("HP Left: {hp}")
    } else {
        "The zombies ate your brain".to_string()
    }
}

/// The prop zombies chase. Its pose may be moved (grabbed) while the horde runs and its
/// hp pool is separate from any bot hp.
#[derive(Clone)]
pub struct TargetHandle {
    pose: Arc<watch::Sender<Pose>>,
    hp: Arc<watch::Sender<i32>>,
}

impl TargetHandle {
    fn new(pose: Pose, hp: i32) -> Self {
        Self {
            pose: Arc::new(watch::channel(pose).0),
            hp: Arc::new(watch::channel(hp.max(0)).0),
        }
    }

    pub fn pose(&self) -> Pose {
        *self.pose.borrow()
    }

    pub fn move_to(&self, pose: Pose) {
        self.pose.send_replace(pose);
    }

    pub fn hp(&self) -> i32 {
        *self.hp.borrow()
    }

    pub fn watch_hp(&self) -> watch::Receiver<i32> {
        self.hp.subscribe()
    }

    fn watch_pose(&self) -> watch::Receiver<Pose> {
        self.pose.subscribe()
    }

    fn damage(&self, amount: i32) -> i32 {
        let hp = (self.hp() - amount).max(0);
        self.hp.send_replace(hp);
        hp
    }
}

struct TargetProp {
    body: ActorId,
    title: ActorId,
    hp_label: ActorId,
}

// Zombies spawn on an interval away from the target and chase it along the routing
// table computed when the session starts. Every zombie that gets through eats into the
// target's hp; losing is left to whoever watches that hp.
pub struct ZombieHorde {
    tuning: ZombieHordeTuning,
    target: TargetHandle,
    prop: Option<TargetProp>,
    routing: Arc<RoutingTable>,
}

impl ZombieHorde {
    pub fn new(tuning: ZombieHordeTuning) -> Self {
        let pose = Pose::at(Vec3::from_array(tuning.target.position));
        let target = TargetHandle::new(pose, tuning.target.hp);
        Self {
            tuning,
            target,
            prop: None,
            routing: Arc::new(RoutingTable::default()),
        }
    }

    fn spawn_one(&self, ctx: &mut SessionCtx<'_>) {
        let candidates = ctx.waypoints();
        let occupied = ctx.occupied();
        let nearest = read(ctx.graph()).nearest_node(self.target.pose().position);
        let Some(waypoint) = pick_spawn_slot(&candidates, &occupied, nearest, ctx.rng()) else {
            debug!("no free waypoint away from the target");
            return;
        };
        ctx.spawn_bot(BotSpec {
            waypoint,
            model: self.tuning.model.clone(),
            hp: self.tuning.hp,
            ttl: None,
            movement: Movement::Chase {
                target: self.target.watch_pose(),
                routing: Arc::clone(&self.routing),
            },
        });
    }
}

impl ModePolicy for ZombieHorde {
    fn kind(&self) -> GameModeKind {
        GameModeKind::ZombieHorde
    }

    fn spawn_interval(&self) -> Option<Duration> {
        Some(self.tuning.spawn_interval())
    }

    fn on_start(&mut self, ctx: &mut SessionCtx<'_>) {
        self.routing = Arc::new(RoutingTable::compute(&read(ctx.graph())));
        debug!(nodes = self.routing.len(), "routing table computed");

        let stage = Arc::clone(ctx.stage());
        let body = stage.spawn_model(&self.tuning.target.resource_id, self.target.pose());
        let hp = self.target.hp();
        self.prop = Some(TargetProp {
            body,
            title: stage.spawn_label(body, TITLE_OFFSET, TITLE),
            hp_label: stage.spawn_label(body, HP_OFFSET, &hp_text(hp)),
        });
        ctx.emit(SessionEvent::TargetHp { hp });

        self.spawn_one(ctx);
    }

    fn on_interval(&mut self, ctx: &mut SessionCtx<'_>) {
        self.spawn_one(ctx);
    }

    fn on_bot_finished(&mut self, ctx: &mut SessionCtx<'_>, bot: FinishedBot, outcome: Outcome) {
        if outcome != Outcome::Reached {
            return;
        }
        let hp = self.target.damage(self.tuning.target.damage_per_bot);
        if let Some(prop) = &self.prop {
            ctx.stage().set_text(prop.hp_label, &hp_text(hp));
        }
        ctx.emit(SessionEvent::TargetHp { hp });
        info!(bot_id = bot.bot_id, hp, "zombie reached the target");
        if hp == 0 {
            info!("target overrun");
        }
    }

    fn on_stop(&mut self, ctx: &mut SessionCtx<'_>) {
        if let Some(prop) = self.prop.take() {
            let stage = ctx.stage();
            stage.destroy(prop.hp_label);
            stage.destroy(prop.title);
            stage.destroy(prop.body);
        }
    }

    fn target(&self) -> Option<TargetHandle> {
        Some(self.target.clone())
    }
}
