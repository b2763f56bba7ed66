//! Utility modules for errors, configuration and the host environment

pub mod config;
pub mod error;
pub mod network;
pub mod platform;
pub mod tools;

// Re-export for convenience
pub use config::{AppSettings, VideoQuality};
pub use error::{BatchError, YouDownloadError};
pub use network::check_connectivity;
pub use platform::{app_data_dir, config_dir, default_download_dir, error_log_path};
pub use tools::Toolchain;
