use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A payload already exists for this identifier.
    #[error("result already published at {0}")]
    AlreadyPublished(PathBuf),
    /// The step could not be started.
    #[error("failed to launch step: {0}")]
    Launch(String),
    #[error("invalid channel state: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
