//! Intake error types

use thiserror::Error;

/// Intake error
#[derive(Debug, Error)]
pub enum IntakeError {
    /// A replay recording could not be loaded
    #[error("failed to load replay recording from '{path}': {message}")]
    ReplayLoad { path: String, message: String },

    /// The intake channel was closed while sources were still delivering
    #[error("intake channel closed for topic {topic}")]
    ChannelClosed { topic: String },
}

impl IntakeError {
    pub fn replay_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReplayLoad {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, IntakeError>;
