use crate::queue::{BatchEvent, DownloadRequest, RetryPolicy};

/// Commands sent from the front end to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    StartBatch {
        requests: Vec<DownloadRequest>,
        policy: RetryPolicy,
    },
    /// Stop the running batch at its next checkpoint
    Stop,
    /// Run the last batch again (see `ResumeMode`)
    Resume,
    ProbeNetwork,
    // System
    Shutdown,
}

/// Events sent from the backend to the front end
#[derive(Debug, Clone)]
pub enum BackendEvent {
    Batch(BatchEvent),
    NetworkProbed { reachable: bool },
    /// A command could not be carried out
    Error(String),
}

/// What `Resume` re-runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeMode {
    /// The full request list of the last `StartBatch`
    #[default]
    Restart,
    /// Only the requests that have not succeeded yet
    SkipCompleted,
}
