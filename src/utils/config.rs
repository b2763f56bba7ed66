//! Application configuration

use crate::utils::error::YouDownloadError;
use crate::utils::platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Application settings, persisted as `settings.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Last-used download location
    pub download_location: PathBuf,

    /// Preferred video quality
    pub quality: VideoQuality,

    /// Attempts per item made by the orchestrator
    pub retry_attempts: u32,

    /// Seconds to wait between attempts
    pub retry_delay_secs: u64,

    /// HTTP chunk size handed to yt-dlp (bytes)
    pub chunk_size: u64,

    /// yt-dlp's own retry count for requests and fragments
    pub internal_retries: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            download_location: platform::default_download_dir(),
            quality: VideoQuality::Best,
            retry_attempts: 3,
            retry_delay_secs: 5,
            chunk_size: 10 * 1024 * 1024, // 10MB
            internal_retries: 10,
        }
    }
}

impl AppSettings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        platform::config_dir().join("settings.json")
    }

    /// Load settings from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, YouDownloadError> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| YouDownloadError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Write settings to `path`, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), YouDownloadError> {
        let to_settings_err = |source| YouDownloadError::Settings {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(to_settings_err)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(to_settings_err)?;

        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Video quality options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoQuality {
    #[default]
    Best,
    /// Best stream no taller than the given height
    MaxHeight(u32),
    /// Audio track transcoded to MP3
    AudioOnly,
}

impl VideoQuality {
    /// Presets offered to users
    pub const PRESETS: [VideoQuality; 6] = [
        VideoQuality::Best,
        VideoQuality::MaxHeight(1080),
        VideoQuality::MaxHeight(720),
        VideoQuality::MaxHeight(480),
        VideoQuality::MaxHeight(360),
        VideoQuality::AudioOnly,
    ];

    /// yt-dlp format selector for this quality
    pub fn format_selector(&self) -> String {
        match self {
            VideoQuality::Best => "best".to_string(),
            VideoQuality::MaxHeight(height) => format!("best[height<={}]", height),
            VideoQuality::AudioOnly => "bestaudio/best".to_string(),
        }
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self, VideoQuality::AudioOnly)
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoQuality::Best => write!(f, "Best Quality"),
            VideoQuality::MaxHeight(height) => write!(f, "{}p", height),
            VideoQuality::AudioOnly => write!(f, "Audio Only (MP3)"),
        }
    }
}

impl FromStr for VideoQuality {
    type Err = YouDownloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "best" => Ok(VideoQuality::Best),
            "audio" | "mp3" => Ok(VideoQuality::AudioOnly),
            other => other
                .trim_end_matches('p')
                .parse::<u32>()
                .ok()
                .filter(|height| *height > 0)
                .map(VideoQuality::MaxHeight)
                .ok_or_else(|| YouDownloadError::InvalidQuality(s.to_string())),
        }
    }
}
