//! Sequential batch orchestration with bounded retries and cooperative stop

use crate::downloader::{FetchError, Fetcher, TransferProgress};
use crate::queue::events::{BatchEvent, ErrorLog, ErrorRecord};
use crate::queue::job::{BatchOutcome, BatchState, DownloadRequest, JobOutcome};
use crate::queue::retry::{is_transient, RetryPolicy};
use crate::utils::error::BatchError;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const WRITE_TEST_FILE: &str = ".youdownload-write-test";

/// Drives batches of downloads through a [`Fetcher`], one item at a time
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    error_log: Option<Arc<ErrorLog>>,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            error_log: None,
        }
    }

    /// Also append every failed item to `log`
    pub fn with_error_log(mut self, log: Arc<ErrorLog>) -> Self {
        self.error_log = Some(log);
        self
    }

    /// Run `requests` in order under `policy` until done or `cancel` fires.
    ///
    /// Per-item failures never abort the batch; they are collected in the
    /// returned outcome. The only batch-level errors are invalid input and an
    /// unusable target directory, both reported before any attempt is made.
    pub async fn run_batch(
        &self,
        requests: &[DownloadRequest],
        policy: RetryPolicy,
        cancel: CancellationToken,
        events: mpsc::Sender<BatchEvent>,
    ) -> Result<BatchOutcome, BatchError> {
        if requests.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        if !policy.is_valid() {
            return Err(BatchError::InvalidPolicy);
        }
        prepare_target_dirs(requests).await?;

        let batch_id = Uuid::new_v4().to_string();
        let mut state = BatchState::new(requests, cancel);
        info!(
            "Starting batch {} with {} item(s) using {}",
            batch_id,
            requests.len(),
            self.fetcher.id()
        );
        emit(
            &events,
            BatchEvent::BatchStarted {
                batch_id: batch_id.clone(),
                total: requests.len(),
            },
        )
        .await;

        for index in 0..state.jobs.len() {
            if state.cancel.is_cancelled() {
                self.abandon_from(&mut state, index, &events).await;
                break;
            }

            let request = state.jobs[index].request.clone();
            info!("Item {}: starting {}", index + 1, request.source);
            emit(
                &events,
                BatchEvent::ItemStarted {
                    index,
                    source: request.source.clone(),
                },
            )
            .await;

            let (outcome, attempts) = self
                .run_job(index, &request, policy, &state.cancel, &events)
                .await;
            state.jobs[index].attempts = attempts;

            match outcome {
                JobOutcome::Succeeded => {
                    info!("Item {}: done after {} attempt(s)", index + 1, attempts);
                    state.finish(index, JobOutcome::Succeeded);
                    emit(&events, BatchEvent::ItemSucceeded { index, attempts }).await;
                }
                JobOutcome::Failed(err) => {
                    error!(
                        "Item {}: {} failed after {} attempt(s): {}",
                        index + 1,
                        request.source,
                        attempts,
                        err
                    );
                    self.record_failure(&batch_id, &request, attempts, &err).await;
                    state.finish(index, JobOutcome::Failed(err.clone()));
                    emit(
                        &events,
                        BatchEvent::ItemFailed {
                            index,
                            attempts,
                            error: err,
                        },
                    )
                    .await;
                }
                JobOutcome::Cancelled => {
                    self.abandon_from(&mut state, index, &events).await;
                    break;
                }
            }
        }

        let outcome = state.outcome();
        info!(
            "Batch {} finished: {} succeeded, {} failed, cancelled={}",
            batch_id,
            outcome.succeeded,
            outcome.failed_count(),
            outcome.cancelled
        );
        emit(
            &events,
            BatchEvent::BatchFinished {
                batch_id,
                outcome: outcome.clone(),
            },
        )
        .await;

        Ok(outcome)
    }

    /// Attempt one item until it succeeds, fails fatally, runs out of
    /// attempts, or the batch is stopped. Returns the outcome and attempt count.
    async fn run_job(
        &self,
        index: usize,
        request: &DownloadRequest,
        policy: RetryPolicy,
        cancel: &CancellationToken,
        events: &mpsc::Sender<BatchEvent>,
    ) -> (JobOutcome, u32) {
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return (JobOutcome::Cancelled, attempts);
            }
            attempts += 1;

            let err = match self.attempt(index, request, cancel, events).await {
                Ok(()) => return (JobOutcome::Succeeded, attempts),
                Err(_) if cancel.is_cancelled() => return (JobOutcome::Cancelled, attempts),
                Err(err) => err,
            };

            if !is_transient(&err) || attempts >= policy.max_attempts {
                return (JobOutcome::Failed(err), attempts);
            }

            warn!(
                "Item {}: attempt {}/{} failed, retrying in {:?}: {}",
                index + 1,
                attempts,
                policy.max_attempts,
                policy.delay,
                err
            );
            emit(
                events,
                BatchEvent::ItemRetrying {
                    index,
                    next_attempt: attempts + 1,
                    error: err.message.clone(),
                    delay: policy.delay,
                },
            )
            .await;

            tokio::select! {
                _ = tokio::time::sleep(policy.delay) => {}
                _ = cancel.cancelled() => {}
            }
        }
    }

    /// One call into the fetcher, forwarding its progress as batch events
    async fn attempt(
        &self,
        index: usize,
        request: &DownloadRequest,
        cancel: &CancellationToken,
        events: &mpsc::Sender<BatchEvent>,
    ) -> Result<(), FetchError> {
        let (progress_tx, mut progress_rx) = mpsc::channel::<TransferProgress>(64);
        let mut fetch = self.fetcher.fetch(request, progress_tx, cancel.clone());

        let result = loop {
            tokio::select! {
                result = &mut fetch => break result,
                Some(progress) = progress_rx.recv() => {
                    emit(events, BatchEvent::ItemProgress { index, progress }).await;
                }
            }
        };

        while let Ok(progress) = progress_rx.try_recv() {
            emit(events, BatchEvent::ItemProgress { index, progress }).await;
        }
        result
    }

    async fn abandon_from(
        &self,
        state: &mut BatchState,
        index: usize,
        events: &mpsc::Sender<BatchEvent>,
    ) {
        info!("Batch stopped at item {}", index + 1);
        let pending: Vec<usize> = (index..state.jobs.len())
            .filter(|&i| !state.jobs[i].is_finished())
            .collect();
        state.cancel_from(index);
        for index in pending {
            emit(events, BatchEvent::ItemCancelled { index }).await;
        }
    }

    async fn record_failure(
        &self,
        batch_id: &str,
        request: &DownloadRequest,
        attempts: u32,
        err: &FetchError,
    ) {
        let Some(log) = &self.error_log else {
            return;
        };

        let record = ErrorRecord {
            timestamp: Utc::now(),
            batch_id: batch_id.to_string(),
            source: request.source.clone(),
            attempts,
            error: err.message.clone(),
        };
        if let Err(e) = log.append(&record).await {
            warn!("Failed to write error log {:?}: {}", log.path(), e);
        }
    }
}

/// Make sure every target directory exists and is writable
async fn prepare_target_dirs(requests: &[DownloadRequest]) -> Result<(), BatchError> {
    let dirs: HashSet<&Path> = requests.iter().map(|r| r.target_dir.as_path()).collect();

    for dir in dirs {
        let unusable = |reason: String| BatchError::TargetDirectory {
            path: dir.to_path_buf(),
            reason,
        };

        if !dir.exists() {
            debug!("Creating target directory {:?}", dir);
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| unusable(e.to_string()))?;
        }

        let metadata = tokio::fs::metadata(dir)
            .await
            .map_err(|e| unusable(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(unusable("not a directory".to_string()));
        }
        check_writable(dir)
            .await
            .map_err(|e| unusable(format!("not writable: {}", e)))?;
    }
    Ok(())
}

/// Create and remove a marker file in `dir`
async fn check_writable(dir: &Path) -> std::io::Result<()> {
    let marker = dir.join(WRITE_TEST_FILE);
    tokio::fs::File::create(&marker).await?;
    tokio::fs::remove_file(&marker).await
}

async fn emit(events: &mpsc::Sender<BatchEvent>, event: BatchEvent) {
    // A closed receiver only means nobody is watching
    let _ = events.send(event).await;
}
