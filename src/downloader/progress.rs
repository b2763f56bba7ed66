//! Progress tracking for transfers

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of one transfer, published at the fetcher's granularity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferProgress {
    pub downloaded_bytes: u64,
    /// Unknown for live streams and some fragmented formats
    pub total_bytes: Option<u64>,
    pub speed: f64, // bytes per second
    pub eta: Option<Duration>,
}

impl TransferProgress {
    pub fn new(downloaded_bytes: u64, total_bytes: Option<u64>) -> Self {
        Self {
            downloaded_bytes,
            total_bytes,
            speed: 0.0,
            eta: None,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;

        self.eta = match self.total_bytes {
            Some(total) if downloaded_bytes >= total => Some(Duration::ZERO),
            Some(total) if speed > 0.0 => Some(Duration::from_secs_f64(
                (total - downloaded_bytes) as f64 / speed,
            )),
            _ => None,
        };
    }

    /// Get progress percentage (0.0 to 1.0), if the total is known
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some((self.downloaded_bytes as f64 / total as f64).min(1.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_progress() {
        let progress = TransferProgress::new(0, Some(1000));
        assert_eq!(progress.downloaded_bytes, 0);
        assert_eq!(progress.speed, 0.0);
        assert_eq!(progress.eta, None);
        assert_eq!(progress.percentage(), Some(0.0));
    }

    #[test]
    fn test_update_computes_eta() {
        let mut progress = TransferProgress::new(0, Some(1000));
        progress.update(500, 100.0);
        assert_eq!(progress.eta, Some(Duration::from_secs(5)));
        assert_eq!(progress.percentage(), Some(0.5));
    }

    #[test]
    fn test_update_at_completion() {
        let mut progress = TransferProgress::new(0, Some(1000));
        progress.update(1000, 0.0);
        assert_eq!(progress.eta, Some(Duration::ZERO));
    }

    #[test]
    fn test_unknown_total() {
        let mut progress = TransferProgress::new(0, None);
        progress.update(4096, 1024.0);
        assert_eq!(progress.eta, None);
        assert_eq!(progress.percentage(), None);
    }

    #[test]
    fn test_zero_total_has_no_percentage() {
        let progress = TransferProgress::new(0, Some(0));
        assert_eq!(progress.percentage(), None);
    }
}
