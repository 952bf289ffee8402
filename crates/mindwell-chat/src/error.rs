//! Error types for a conversational turn.

use mindwell_core::error::MindwellError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("model error: {0}")]
    Model(String),
    #[error("tool error: {0}")]
    Tool(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<MindwellError> for ChatError {
    fn from(err: MindwellError) -> Self {
        ChatError::Storage(err.to_string())
    }
}
