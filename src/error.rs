use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {0}")]
    Status(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("Page context error: {0}")]
    Context(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
