//! Host error types.

use snapweld_core::SettingsError;
use thiserror::Error;

/// Errors raised while loading or replaying a layout script.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid layout: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Unknown segment: {0}")]
    UnknownSegment(String),
    #[error("Segment name used twice: {0}")]
    DuplicateName(String),
    #[error("Segment {segment} has no point {index}")]
    InvalidPoint { segment: String, index: usize },
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
