//! Discovery of the external binaries YouDownload drives
//!
//! yt-dlp performs extraction and transfer; ffmpeg is required by yt-dlp for
//! audio extraction and stream merging. Both are resolved once at startup and
//! a missing binary is reported as a configuration error.

use crate::utils::error::YouDownloadError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const YTDLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";

/// Resolved paths to the external tools
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
}

impl Toolchain {
    /// Locate yt-dlp and ffmpeg, failing if either is absent
    pub fn discover() -> Result<Self, YouDownloadError> {
        let ytdlp = find_tool(YTDLP).ok_or(YouDownloadError::ToolNotFound(YTDLP))?;
        let ffmpeg = find_tool(FFMPEG).ok_or(YouDownloadError::ToolNotFound(FFMPEG))?;
        Ok(Self { ytdlp, ffmpeg })
    }
}

/// Find a binary with priority:
/// 1. Next to the current executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_tool(name: &str) -> Option<PathBuf> {
    if let Some(bundled) = find_beside_executable(name) {
        info!("✓ Using bundled {}: {:?}", name, bundled);
        return Some(bundled);
    }

    if let Ok(system) = which::which(name) {
        info!("✓ Using system {}: {:?}", name, system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths(name) {
        info!("✓ Using {} from common path: {:?}", name, common);
        return Some(common);
    }

    warn!("✗ {} not found anywhere!", name);
    None
}

fn find_beside_executable(name: &str) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;
    debug!("Checking {:?} for bundled {}", exe_dir, name);

    let candidate = exe_dir.join(executable_name(name));
    if is_executable(&candidate) {
        return Some(candidate);
    }

    let candidate = exe_dir.join("bin").join(executable_name(name));
    is_executable(&candidate).then_some(candidate)
}

fn find_in_common_paths(name: &str) -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin"),
        // macOS Homebrew (Intel) / manual installs
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/usr/bin"),
    ];
    // pip --user installs
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin"));
    }

    candidates
        .into_iter()
        .map(|dir| dir.join(executable_name(name)))
        .find(|path| is_executable(path))
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
