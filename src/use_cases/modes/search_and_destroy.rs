use tracing::info;

use crate::domain::Outcome;
use crate::domain::tuning::SearchAndDestroyTuning;
use crate::use_cases::bot::{BotSpec, Movement};
use crate::use_cases::session::{ModePolicy, SessionCtx};
use crate::use_cases::types::{FinishedBot, GameModeKind, SessionEvent};

// One hidden bot per waypoint; the round is won when the last one dies.
pub struct SearchAndDestroy {
    tuning: SearchAndDestroyTuning,
    won: bool,
}

impl SearchAndDestroy {
    pub fn new(tuning: SearchAndDestroyTuning) -> Self {
        Self { tuning, won: false }
    }
}

impl ModePolicy for SearchAndDestroy {
    fn kind(&self) -> GameModeKind {
        GameModeKind::SearchAndDestroy
    }

    fn on_start(&mut self, ctx: &mut SessionCtx<'_>) {
        self.won = false;
        for waypoint in ctx.waypoints() {
            ctx.spawn_bot(BotSpec {
                waypoint,
                model: self.tuning.model.clone(),
                hp: self.tuning.hp,
                ttl: None,
                movement: Movement::Static,
            });
        }
    }

    fn on_bot_finished(&mut self, ctx: &mut SessionCtx<'_>, _bot: FinishedBot, outcome: Outcome) {
        if outcome == Outcome::Dead && ctx.live_bots() == 0 && !self.won {
            self.won = true;
            info!("every target destroyed");
            ctx.emit(SessionEvent::Won);
        }
    }
}
