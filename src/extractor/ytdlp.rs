//! yt-dlp wrapper for metadata extraction

use crate::extractor::models::{PlaylistEntry, VideoInfo};
use crate::extractor::traits::Extractor;
use crate::utils::error::YouDownloadError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, warn};

/// Video extractor using yt-dlp
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(ytdlp_path: PathBuf) -> Self {
        Self { ytdlp_path }
    }

    async fn run(&self, args: &[&str], url: &str) -> Result<String> {
        let output = AsyncCommand::new(&self.ytdlp_path)
            .args(args)
            .arg("--no-warnings")
            .arg("--")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp extraction failed: {}", error_msg);
            return Err(YouDownloadError::ExtractionError(error_msg.trim().to_string()).into());
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    /// Uses: yt-dlp --dump-json --no-download --no-playlist
    async fn extract_info(&self, url: &str) -> Result<VideoInfo> {
        debug!("Extracting video info for URL: {}", url);
        let json_str = self
            .run(&["--dump-json", "--no-download", "--no-playlist"], url)
            .await?;
        let video_info: VideoInfo = serde_json::from_str(json_str.trim())?;
        Ok(video_info)
    }

    /// Uses: yt-dlp --flat-playlist --dump-json
    async fn extract_playlist(&self, url: &str) -> Result<Vec<PlaylistEntry>> {
        debug!("Extracting playlist info for URL: {}", url);
        let json_str = self.run(&["--flat-playlist", "--dump-json"], url).await?;
        Ok(parse_playlist_lines(&json_str))
    }
}

/// Parse one JSON object per line, skipping lines that do not parse
pub fn parse_playlist_lines(output: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                // Continue with other entries
                warn!("Failed to parse playlist entry: {}", e);
            }
        }
    }

    entries
}
