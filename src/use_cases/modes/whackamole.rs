use tracing::debug;

use crate::domain::occupancy::pick_spawn_slot;
use crate::domain::tuning::WhackamoleTuning;
use crate::use_cases::bot::{BotSpec, Movement};
use crate::use_cases::session::{ModePolicy, SessionCtx};
use crate::use_cases::types::GameModeKind;
use std::time::Duration;

// A bot pops up on a free waypoint at every tick and misses if it is not shot in time.
// Runs until stopped.
pub struct Whackamole {
    tuning: WhackamoleTuning,
}

impl Whackamole {
    pub fn new(tuning: WhackamoleTuning) -> Self {
        Self { tuning }
    }

    fn spawn_one(&self, ctx: &mut SessionCtx<'_>) {
        let candidates = ctx.waypoints();
        let occupied = ctx.occupied();
        let Some(waypoint) = pick_spawn_slot(&candidates, &occupied, None, ctx.rng()) else {
            debug!("no free waypoint");
            return;
        };
        let movement = if self.tuning.moving {
            Movement::Wander
        } else {
            Movement::Static
        };
        ctx.spawn_bot(BotSpec {
            waypoint,
            model: self.tuning.model.clone(),
            hp: self.tuning.hp,
            ttl: Some(self.tuning.ttl()),
            movement,
        });
    }
}

impl ModePolicy for Whackamole {
    fn kind(&self) -> GameModeKind {
        GameModeKind::Whackamole
    }

    fn spawn_interval(&self) -> Option<Duration> {
        Some(self.tuning.spawn_interval())
    }

    fn on_start(&mut self, ctx: &mut SessionCtx<'_>) {
        self.spawn_one(ctx);
    }

    fn on_interval(&mut self, ctx: &mut SessionCtx<'_>) {
        self.spawn_one(ctx);
    }
}
