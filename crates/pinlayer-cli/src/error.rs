use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] pinlayer_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No comment text provided")]
    EmptyContent,
    #[error("Comment ID cannot be empty")]
    EmptyCommentId,
    #[error("Comment not found for id/prefix: {0}")]
    CommentNotFound(String),
    #[error("{0}")]
    AmbiguousCommentId(String),
    #[error("Coordinates must be finite numbers")]
    InvalidCoordinates,
    #[error("Failed to save comment: {0}")]
    Sync(String),
    #[error("Replay script error: {0}")]
    Replay(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
