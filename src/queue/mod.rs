pub mod events;
pub mod job;
pub mod orchestrator;
pub mod retry;

pub use events::{BatchEvent, ErrorLog, ErrorRecord};
pub use job::{BatchOutcome, BatchState, DownloadJob, DownloadRequest, JobOutcome};
pub use orchestrator::Orchestrator;
pub use retry::{classify, is_transient, RetryPolicy, TRANSIENT_KEYWORDS};
