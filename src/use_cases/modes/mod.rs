// Concrete game modes built on the shared session runtime.

pub mod search_and_destroy;
pub mod target_practice;
pub mod whackamole;
pub mod zombie_horde;

pub use search_and_destroy::SearchAndDestroy;
pub use target_practice::TargetPractice;
pub use whackamole::Whackamole;
pub use zombie_horde::{TargetHandle, ZombieHorde};

use crate::domain::tuning::RangeTuning;
use crate::use_cases::session::ModePolicy;
use crate::use_cases::types::GameModeKind;

pub fn build_policy(kind: GameModeKind, tuning: &RangeTuning) -> Box<dyn ModePolicy> {
    match kind {
        GameModeKind::TargetPractice => Box::new(TargetPractice::new(tuning.target_practice.clone())),
        GameModeKind::Whackamole => Box::new(Whackamole::new(tuning.whackamole.clone())),
        GameModeKind::SearchAndDestroy => {
            Box::new(SearchAndDestroy::new(tuning.search_and_destroy.clone()))
        }
        GameModeKind::ZombieHorde => Box::new(ZombieHorde::new(tuning.zombie_horde.clone())),
    }
}
