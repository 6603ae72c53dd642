use thiserror::Error;

use crate::domain::entities::RangeAction;

// Errors surfaced to the application layer driving the range.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("caller is not allowed to {action}")]
    Forbidden { action: RangeAction },
    #[error("level storage failed: {0}")]
    StorageFailure(String),
    #[error("no game session is running")]
    NoActiveSession,
}
