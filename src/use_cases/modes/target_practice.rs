use tracing::info;

use crate::domain::tuning::TargetPracticeTuning;
use crate::domain::{NodeId, Outcome};
use crate::use_cases::bot::{BotSpec, Movement};
use crate::use_cases::session::{ModePolicy, SessionCtx};
use crate::use_cases::sync::read;
use crate::use_cases::types::{FinishedBot, GameModeKind};

// One static bot per waypoint. Dead bots come back after a delay, or the whole set
// comes back once every bot is down.
pub struct TargetPractice {
    tuning: TargetPracticeTuning,
}

impl TargetPractice {
    pub fn new(tuning: TargetPracticeTuning) -> Self {
        Self { tuning }
    }

    fn spawn_all(&self, ctx: &mut SessionCtx<'_>) {
        for waypoint in ctx.waypoints() {
            self.spawn_at(ctx, waypoint);
        }
    }

    fn spawn_at(&self, ctx: &mut SessionCtx<'_>, waypoint: NodeId) {
        ctx.spawn_bot(BotSpec {
            waypoint,
            model: self.tuning.model.clone(),
            hp: self.tuning.hp,
            ttl: None,
            movement: Movement::Static,
        });
    }
}

impl ModePolicy for TargetPractice {
    fn kind(&self) -> GameModeKind {
        GameModeKind::TargetPractice
    }

    fn on_start(&mut self, ctx: &mut SessionCtx<'_>) {
        self.spawn_all(ctx);
    }

    fn on_bot_finished(&mut self, ctx: &mut SessionCtx<'_>, bot: FinishedBot, _outcome: Outcome) {
        if self.tuning.respawn {
            // Keyed by waypoint so the replacement lands where the old bot stood.
            ctx.schedule(self.tuning.respawn_delay(), bot.spawn_waypoint);
        } else if ctx.live_bots() == 0 {
            info!("all targets down, restarting round");
            self.spawn_all(ctx);
        }
    }

    fn on_timer(&mut self, ctx: &mut SessionCtx<'_>, waypoint: u64) {
        let exists = read(ctx.graph()).contains(waypoint);
        if exists {
            self.spawn_at(ctx, waypoint);
        }
    }
}
