//! Source validation and playlist expansion

use crate::extractor::models::PlaylistEntry;
use crate::queue::DownloadRequest;
use crate::utils::config::VideoQuality;
use std::path::Path;

const SUPPORTED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Accepts YouTube URLs and bare 11-character video ids
pub fn is_supported_url(source: &str) -> bool {
    let source = source.trim();
    if is_video_id(source) {
        return true;
    }

    host(source)
        .map(|host| {
            SUPPORTED_HOSTS
                .iter()
                .any(|supported| host == *supported || host.ends_with(&format!(".{}", supported)))
        })
        .unwrap_or(false)
}

/// True for URLs that name a playlist (`list=` query parameter or `/playlist`)
pub fn is_playlist_url(source: &str) -> bool {
    source.contains("list=") || source.contains("/playlist")
}

/// One request per playlist entry, in playlist order
pub fn expand_requests(
    entries: &[PlaylistEntry],
    target_dir: &Path,
    quality: VideoQuality,
) -> Vec<DownloadRequest> {
    entries
        .iter()
        .map(|entry| DownloadRequest::new(entry.source(), target_dir, quality))
        .collect()
}

fn is_video_id(source: &str) -> bool {
    source.len() == 11
        && source
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn host(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host = authority.rsplit('@').next()?.split(':').next()?;
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}
