//! Error handling for YouDownload

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for YouDownload
#[derive(Debug, Error)]
pub enum YouDownloadError {
    #[error("{0} not found. Please install {0} and make sure it is on PATH")]
    ToolNotFound(&'static str),

    #[error("Failed to extract video info: {0}")]
    ExtractionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid quality '{0}' (expected best, audio, or a height such as 720p)")]
    InvalidQuality(String),

    #[error("Failed to access settings at {}: {source}", .path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a whole batch before any item is attempted
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Batch contains no requests")]
    EmptyBatch,

    #[error("Retry policy must allow at least one attempt")]
    InvalidPolicy,

    #[error("Target directory {} is unusable: {reason}", .path.display())]
    TargetDirectory { path: PathBuf, reason: String },
}
