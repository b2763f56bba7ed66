//! Requests, jobs and batch bookkeeping

use crate::downloader::FetchError;
use crate::utils::config::VideoQuality;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// What to download, where, and at which quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// URL or opaque media id understood by the fetcher
    pub source: String,
    pub target_dir: PathBuf,
    pub quality: VideoQuality,
}

impl DownloadRequest {
    pub fn new(
        source: impl Into<String>,
        target_dir: impl Into<PathBuf>,
        quality: VideoQuality,
    ) -> Self {
        Self {
            source: source.into(),
            target_dir: target_dir.into(),
            quality,
        }
    }
}

/// Terminal state of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed(FetchError),
    Cancelled,
}

/// One item within a batch
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub request: DownloadRequest,
    pub attempts: u32,
    /// `None` while the job has not finished
    pub outcome: Option<JobOutcome>,
}

impl DownloadJob {
    pub fn new(request: DownloadRequest) -> Self {
        Self {
            request,
            attempts: 0,
            outcome: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Working state of one `run_batch` invocation
#[derive(Debug)]
pub struct BatchState {
    pub jobs: Vec<DownloadJob>,
    /// Jobs that reached a terminal outcome
    pub completed: usize,
    /// Fresh for every batch; never reset once cancelled
    pub cancel: CancellationToken,
}

impl BatchState {
    pub fn new(requests: &[DownloadRequest], cancel: CancellationToken) -> Self {
        Self {
            jobs: requests.iter().cloned().map(DownloadJob::new).collect(),
            completed: 0,
            cancel,
        }
    }

    pub fn finish(&mut self, index: usize, outcome: JobOutcome) {
        if let Some(job) = self.jobs.get_mut(index) {
            if job.outcome.is_none() {
                self.completed += 1;
            }
            job.outcome = Some(outcome);
        }
    }

    /// Mark every unfinished job from `index` onward as cancelled
    pub fn cancel_from(&mut self, index: usize) {
        for i in index..self.jobs.len() {
            if !self.jobs[i].is_finished() {
                self.finish(i, JobOutcome::Cancelled);
            }
        }
    }

    pub fn outcome(&self) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for job in &self.jobs {
            match &job.outcome {
                Some(JobOutcome::Succeeded) => outcome.succeeded += 1,
                Some(JobOutcome::Failed(error)) => {
                    outcome.failed.push((job.request.clone(), error.clone()))
                }
                Some(JobOutcome::Cancelled) => outcome.cancelled = true,
                None => {}
            }
        }
        outcome
    }
}

/// Result of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: usize,
    /// Items that failed fatally or exhausted their retries
    pub failed: Vec<(DownloadRequest, FetchError)>,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Human summary listing at most `max_listed` failed sources
    pub fn summary(&self, max_listed: usize) -> String {
        let mut text = format!(
            "{} succeeded, {} failed",
            self.succeeded,
            self.failed_count()
        );
        if self.cancelled {
            text.push_str(" (stopped)");
        }

        if !self.failed.is_empty() {
            let listed: Vec<&str> = self
                .failed
                .iter()
                .take(max_listed)
                .map(|(request, _)| request.source.as_str())
                .collect();
            text.push_str("\nFailed: ");
            text.push_str(&listed.join(", "));

            let hidden = self.failed.len().saturating_sub(max_listed);
            if hidden > 0 {
                text.push_str(&format!(" and {} more", hidden));
            }
        }
        text
    }
}
