use crate::downloader::progress::TransferProgress;
use crate::queue::DownloadRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Core trait for the capability that actually retrieves media
///
/// This isolates the orchestrator from the tool doing the transfer
/// (yt-dlp today, a scripted fake in tests).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns a unique identifier for this fetcher (e.g., "yt-dlp")
    fn id(&self) -> &'static str;

    /// Performs one attempt at retrieving `request` into its target directory.
    ///
    /// Progress snapshots go to `progress` whenever the underlying tool reports
    /// them. When `cancel` fires the fetcher should abort on a best-effort basis.
    async fn fetch(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<(), FetchError>;
}

/// Structured classification a fetcher may attach to its error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchErrorKind {
    /// Likely recoverable by trying again
    Transient,
    /// Retrying will not help
    Fatal,
}

/// Failure of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    /// `None` when the fetcher only has a message to go on
    pub kind: Option<FetchErrorKind>,
    pub message: String,
}

impl FetchError {
    /// An error known only by its message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: Some(FetchErrorKind::Transient),
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: Some(FetchErrorKind::Fatal),
            message: message.into(),
        }
    }
}
