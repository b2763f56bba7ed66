use crate::extractor::models::{PlaylistEntry, VideoInfo};
use anyhow::Result;
use async_trait::async_trait;

/// Metadata lookups that happen before anything is downloaded
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Extracts video information
    async fn extract_info(&self, url: &str) -> Result<VideoInfo>;

    /// Lists the entries of a playlist without resolving their formats
    async fn extract_playlist(&self, _url: &str) -> Result<Vec<PlaylistEntry>> {
        Err(anyhow::anyhow!(
            "Playlist extraction not supported by {}",
            self.id()
        ))
    }
}
