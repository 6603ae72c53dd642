// Use cases layer: graph editing, bot runtime, game sessions and level persistence.

pub mod bot;
pub mod graph_editor;
pub mod level;
pub mod modes;
pub mod range;
pub mod session;
pub(crate) mod sync;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use bot::{BotContext, BotHandle, BotSpec, Movement};
pub use graph_editor::{GraphEditor, SharedGraph};
pub use level::{LoadLevelUseCase, SaveLevelUseCase};
pub use range::RangeController;
pub use session::{GameSession, ModePolicy, SessionCtx, SessionDeps};
pub use types::{BotEvent, BotId, FinishedBot, GameModeKind, SessionEvent};
