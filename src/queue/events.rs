use crate::downloader::{FetchError, TransferProgress};
use crate::queue::job::BatchOutcome;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Events that describe a batch as it runs
///
/// Items are identified by their position in the batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    BatchStarted {
        batch_id: String,
        total: usize,
    },
    ItemStarted {
        index: usize,
        source: String,
    },
    /// Emitted whenever the fetcher reports transfer progress
    ItemProgress {
        index: usize,
        progress: TransferProgress,
    },
    /// A transient failure; `next_attempt` starts after `delay`
    ItemRetrying {
        index: usize,
        next_attempt: u32,
        error: String,
        delay: Duration,
    },
    ItemSucceeded {
        index: usize,
        attempts: u32,
    },
    ItemFailed {
        index: usize,
        attempts: u32,
        error: FetchError,
    },
    ItemCancelled {
        index: usize,
    },
    BatchFinished {
        batch_id: String,
        outcome: BatchOutcome,
    },
}

/// One line of the error log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub batch_id: String,
    pub source: String,
    pub attempts: u32,
    pub error: String,
}

/// Append-only JSON Lines log of item failures
#[derive(Debug, Clone)]
pub struct ErrorLog {
    file_path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl ErrorLog {
    pub async fn open(file_path: &Path) -> Result<Self> {
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .await
            .context("Failed to open error log")?;

        Ok(Self {
            file_path: file_path.to_path_buf(),
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append a record to the log
    pub async fn append(&self, record: &ErrorRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read every record back, skipping lines that do not parse
    pub async fn read_records(&self) -> Result<Vec<ErrorRecord>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.file_path).await?;
        let mut records = Vec::new();

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ErrorRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Failed to parse error log line: {}. Error: {}", line, e);
                }
            }
        }
        Ok(records)
    }
}
