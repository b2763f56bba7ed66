//! Fetch capability: the trait the orchestrator drives and its yt-dlp backend

pub mod fetcher;
pub mod progress;
pub mod ytdlp;

// Re-export for convenience
pub use fetcher::{FetchError, FetchErrorKind, Fetcher};
pub use progress::TransferProgress;
pub use ytdlp::{FetchOptions, YtDlpFetcher};
