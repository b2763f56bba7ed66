//! Data structures for video information

use serde::{Deserialize, Serialize};

/// Video information structure (subset of `yt-dlp --dump-json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(alias = "webpage_url", default)]
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
    pub view_count: Option<u64>,
    #[serde(default)]
    pub formats: Vec<Format>,
}

impl VideoInfo {
    /// Multi-line description shown before a download
    pub fn describe(&self) -> String {
        let views = self
            .view_count
            .map(group_thousands)
            .unwrap_or_else(|| "Unknown".to_string());

        let mut text = format!(
            "Title: {}\nDuration: {}\nUploader: {}\nViews: {}\nUpload Date: {}\n",
            self.title,
            format_duration(self.duration),
            self.uploader.as_deref().unwrap_or("Unknown"),
            views,
            self.upload_date.as_deref().unwrap_or("Unknown"),
        );
        if !self.formats.is_empty() {
            text.push_str(&format!("\nAvailable formats: {}", self.formats.len()));
        }
        text
    }
}

/// Video format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

/// One entry of `yt-dlp --flat-playlist --dump-json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl PlaylistEntry {
    /// Source to hand to the fetcher: the entry URL, or its id
    pub fn source(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.id)
    }

    /// Largest thumbnail available, preferring the explicit one
    pub fn best_thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref().or_else(|| {
            self.thumbnails
                .iter()
                .max_by_key(|t| t.height.unwrap_or(0))
                .map(|t| t.url.as_str())
        })
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

/// Format a duration in seconds as `HH:MM:SS`, or `MM:SS` under an hour
pub fn format_duration(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(s) if s > 0.0 => s as u64,
        _ => return "Unknown".to_string(),
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
