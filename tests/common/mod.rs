//! Scripted fetcher shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use youdownload::downloader::{FetchError, Fetcher, TransferProgress};
use youdownload::queue::{BatchEvent, DownloadRequest};
use youdownload::utils::VideoQuality;

/// What the fake does on a given attempt
#[derive(Clone)]
pub enum Step {
    Succeed,
    Fail(FetchError),
    /// Block until the batch is cancelled, then fail like a killed process
    Hang,
}

/// Fetcher that follows a per-source script; the last step repeats
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Vec<Step>>,
    calls: Mutex<Vec<(String, Instant)>>,
    cancel_after_success: Mutex<Option<(String, CancellationToken)>>,
    hang_started: Option<Arc<Notify>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, source: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(source.to_string(), steps);
        self
    }

    /// Cancel `token` as soon as `source` succeeds
    pub fn cancel_after(self, source: &str, token: CancellationToken) -> Self {
        *self.cancel_after_success.lock().unwrap() = Some((source.to_string(), token));
        self
    }

    /// Notify `signal` whenever a `Hang` step begins
    pub fn notify_on_hang(mut self, signal: Arc<Notify>) -> Self {
        self.hang_started = Some(signal);
        self
    }

    pub fn attempts(&self, source: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == source)
            .count()
    }

    pub fn total_attempts(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_times(&self, source: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == source)
            .map(|(_, t)| *t)
            .collect()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    fn id(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<(), FetchError> {
        let previous = self.attempts(&request.source);
        self.calls
            .lock()
            .unwrap()
            .push((request.source.clone(), Instant::now()));

        let step = self
            .scripts
            .get(&request.source)
            .and_then(|steps| steps.get(previous).or(steps.last()))
            .cloned()
            .unwrap_or(Step::Succeed);

        let _ = progress.send(TransferProgress::new(512, Some(1024))).await;

        match step {
            Step::Succeed => {
                let _ = progress.send(TransferProgress::new(1024, Some(1024))).await;
                let guard = self.cancel_after_success.lock().unwrap();
                if let Some((source, token)) = guard.as_ref() {
                    if *source == request.source {
                        token.cancel();
                    }
                }
                Ok(())
            }
            Step::Fail(err) => Err(err),
            Step::Hang => {
                if let Some(signal) = &self.hang_started {
                    signal.notify_one();
                }
                cancel.cancelled().await;
                Err(FetchError::fatal("Download stopped"))
            }
        }
    }
}

pub fn request(source: &str, dir: &Path) -> DownloadRequest {
    DownloadRequest::new(source, dir, VideoQuality::Best)
}

/// Everything currently buffered on an event receiver
pub fn drain(rx: &mut mpsc::Receiver<BatchEvent>) -> Vec<BatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
