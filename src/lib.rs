//! YouDownload library

pub mod backend;
pub mod cli;
pub mod downloader;
pub mod extractor;
pub mod queue;
pub mod utils;

// Re-export main types for easier use
pub use backend::{BackendActor, BackendCommand, BackendEvent, ResumeMode};
pub use downloader::{FetchError, FetchErrorKind, Fetcher, TransferProgress, YtDlpFetcher};
pub use extractor::{Extractor, PlaylistEntry, VideoInfo, YtDlpExtractor};
pub use queue::{BatchEvent, BatchOutcome, DownloadRequest, Orchestrator, RetryPolicy};
pub use utils::{AppSettings, BatchError, VideoQuality, YouDownloadError};
