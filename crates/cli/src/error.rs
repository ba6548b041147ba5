//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the command layer.
///
/// Commands run on `anyhow` internally; these variants exist for the
/// failures the binary wants to phrase for an operator rather than a
/// developer.
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum CliError {
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("configuration rejected: {message}")]
    ConfigInvalid { message: String },

    #[error("could not load replay recording {}: {message}", path.display())]
    ReplayLoad { path: PathBuf, message: String },

    #[error("pipeline failed: {message}")]
    Pipeline { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[allow(dead_code)]
impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn replay_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ReplayLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn pipeline(message: impl Into<String>) -> Self {
        Self::Pipeline {
            message: message.into(),
        }
    }
}
