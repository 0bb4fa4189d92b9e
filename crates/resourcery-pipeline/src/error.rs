use std::io;

use resourcery_channel::ChannelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
