//! Error types for the conversation engine.

use colloquy_core::ColloquyError;

use crate::session::TurnPhase;

/// Errors from the conversation session.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a turn is already in flight")]
    Busy,
    #[error("invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnPhase, to: TurnPhase },
    #[error("stream failed: {0}")]
    StreamFailed(String),
    #[error("turn cancelled")]
    Cancelled,
    #[error("turn timed out after {0} seconds")]
    TimedOut(u64),
}

impl From<ColloquyError> for ChatError {
    fn from(err: ColloquyError) -> Self {
        match err {
            ColloquyError::Cancelled => ChatError::Cancelled,
            ColloquyError::TimedOut(secs) => ChatError::TimedOut(secs),
            other => ChatError::StreamFailed(other.to_string()),
        }
    }
}
