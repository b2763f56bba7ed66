//! Platform-specific directories for YouDownload
//!
//! - Application data (error log)
//! - Configuration (settings file)
//! - Default download location

use std::path::PathBuf;

/// Returns the application data directory
/// - macOS: ~/Library/Application Support/YouDownload
/// - Windows: %APPDATA%\YouDownload
/// - Linux: ~/.local/share/youdownload
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_dir_name())
}

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/YouDownload
/// - Windows: %APPDATA%\YouDownload
/// - Linux: ~/.config/youdownload
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(app_dir_name())
    }

    #[cfg(not(target_os = "linux"))]
    {
        app_data_dir()
    }
}

/// Returns the default download directory (~/Downloads on every platform)
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("./downloads"))
}

/// Location of the append-only error log
pub fn error_log_path() -> PathBuf {
    app_data_dir().join("error_log.jsonl")
}

fn app_dir_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "youdownload"
    } else {
        "YouDownload"
    }
}
