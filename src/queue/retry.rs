//! Retry policy and failure classification

use crate::downloader::{FetchError, FetchErrorKind};
use crate::utils::config::AppSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Substrings that mark an unclassified error as network-related
pub const TRANSIENT_KEYWORDS: [&str; 8] = [
    "connection",
    "timeout",
    "timed out",
    "network",
    "unreachable",
    "refused",
    "reset",
    "broken pipe",
];

/// How many times an item is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.max_attempts >= 1
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Decide whether `error` is worth another attempt
///
/// A structured kind from the fetcher wins; otherwise the message is matched
/// against [`TRANSIENT_KEYWORDS`] case-insensitively.
pub fn classify(error: &FetchError) -> FetchErrorKind {
    if let Some(kind) = error.kind {
        return kind;
    }

    let message = error.message.to_lowercase();
    if TRANSIENT_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
    {
        FetchErrorKind::Transient
    } else {
        FetchErrorKind::Fatal
    }
}

pub fn is_transient(error: &FetchError) -> bool {
    classify(error) == FetchErrorKind::Transient
}
