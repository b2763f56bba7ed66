use super::messages::{BackendCommand, BackendEvent, ResumeMode};
use crate::queue::{BatchEvent, BatchOutcome, DownloadRequest, Orchestrator, RetryPolicy};
use crate::utils::network;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sent by a batch task when it ends
struct BatchReport {
    generation: u64,
    requests: Vec<DownloadRequest>,
    succeeded: HashSet<usize>,
    result: Result<BatchOutcome, String>,
}

struct RunningBatch {
    generation: u64,
    cancel: CancellationToken,
    /// Set before `BatchFinished` reaches the front end
    finished: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

enum Input {
    Command(Option<BackendCommand>),
    Finished(BatchReport),
}

/// Owns the current batch and turns front-end commands into orchestrator runs
pub struct BackendActor {
    receiver: mpsc::Receiver<BackendCommand>,
    sender: mpsc::Sender<BackendEvent>,

    orchestrator: Arc<Orchestrator>,
    resume_mode: ResumeMode,

    done_tx: mpsc::Sender<BatchReport>,
    done_rx: mpsc::Receiver<BatchReport>,
    generation: u64,
    running: Option<RunningBatch>,

    // Resume bookkeeping
    batch_requests: Vec<DownloadRequest>,
    remaining: Vec<DownloadRequest>,
    policy: RetryPolicy,
}

impl BackendActor {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        resume_mode: ResumeMode,
        receiver: mpsc::Receiver<BackendCommand>,
        sender: mpsc::Sender<BackendEvent>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::channel(4);
        Self {
            receiver,
            sender,
            orchestrator,
            resume_mode,
            done_tx,
            done_rx,
            generation: 0,
            running: None,
            batch_requests: Vec::new(),
            remaining: Vec::new(),
            policy: RetryPolicy::default(),
        }
    }

    pub async fn run(mut self) {
        info!("BackendActor started");

        loop {
            let input = tokio::select! {
                cmd = self.receiver.recv() => Input::Command(cmd),
                Some(report) = self.done_rx.recv() => Input::Finished(report),
            };

            match input {
                Input::Finished(report) => self.on_finished(report).await,
                Input::Command(None) | Input::Command(Some(BackendCommand::Shutdown)) => {
                    info!("BackendActor shutting down");
                    if let Some(running) = &self.running {
                        running.cancel.cancel();
                    }
                    self.settle().await;
                    break;
                }
                Input::Command(Some(cmd)) => self.handle_command(cmd).await,
            }
        }
    }

    async fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::StartBatch { requests, policy } => {
                if self.is_busy() {
                    self.report_error("A batch is already running").await;
                    return;
                }
                self.settle().await;
                self.batch_requests = requests.clone();
                self.remaining = requests.clone();
                self.policy = policy;
                self.spawn_batch(requests);
            }
            BackendCommand::Stop => match &self.running {
                Some(running) => {
                    info!("Stopping batch {}", running.generation);
                    running.cancel.cancel();
                }
                None => debug!("Stop requested with no batch running"),
            },
            BackendCommand::Resume => {
                if self.is_busy() {
                    self.report_error("A batch is already running").await;
                    return;
                }
                self.settle().await;

                let requests = match self.resume_mode {
                    ResumeMode::Restart => self.batch_requests.clone(),
                    ResumeMode::SkipCompleted => self.remaining.clone(),
                };
                if requests.is_empty() {
                    self.report_error("Nothing to resume").await;
                    return;
                }
                info!("Resuming with {} item(s)", requests.len());
                self.spawn_batch(requests);
            }
            BackendCommand::ProbeNetwork => {
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let reachable = network::check_connectivity().await;
                    let _ = sender.send(BackendEvent::NetworkProbed { reachable }).await;
                });
            }
            // Handled by the run loop
            BackendCommand::Shutdown => {}
        }
    }

    /// A batch is running and has not been asked to stop
    fn is_busy(&self) -> bool {
        self.running
            .as_ref()
            .map(|running| {
                !running.cancel.is_cancelled() && !running.finished.load(Ordering::SeqCst)
            })
            .unwrap_or(false)
    }

    /// Wait for a stopped batch to wind down and apply its report
    async fn settle(&mut self) {
        if let Some(running) = self.running.take() {
            if let Err(e) = running.handle.await {
                warn!("Batch task {} ended abnormally: {}", running.generation, e);
            }
        }
        while let Ok(report) = self.done_rx.try_recv() {
            self.on_finished(report).await;
        }
    }

    fn spawn_batch(&mut self, requests: Vec<DownloadRequest>) {
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();

        let orchestrator = Arc::clone(&self.orchestrator);
        let sender = self.sender.clone();
        let done_tx = self.done_tx.clone();
        let policy = self.policy;
        let token = cancel.clone();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_flag = Arc::clone(&finished);

        let handle = tokio::spawn(async move {
            let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(256);

            let run = orchestrator.run_batch(&requests, policy, token, event_tx);
            let relay = async {
                let mut succeeded = HashSet::new();
                while let Some(event) = event_rx.recv().await {
                    match &event {
                        BatchEvent::ItemSucceeded { index, .. } => {
                            succeeded.insert(*index);
                        }
                        BatchEvent::BatchFinished { .. } => {
                            finished_flag.store(true, Ordering::SeqCst);
                        }
                        _ => {}
                    }
                    let _ = sender.send(BackendEvent::Batch(event)).await;
                }
                succeeded
            };
            let (result, succeeded) = tokio::join!(run, relay);

            let report = BatchReport {
                generation,
                requests,
                succeeded,
                result: result.map_err(|e| e.to_string()),
            };
            let _ = done_tx.send(report).await;
        });

        self.running = Some(RunningBatch {
            generation,
            cancel,
            finished,
            handle,
        });
    }

    async fn on_finished(&mut self, report: BatchReport) {
        if self
            .running
            .as_ref()
            .is_some_and(|running| running.generation == report.generation)
        {
            self.running = None;
        }

        match report.result {
            Ok(_) => {
                self.remaining = report
                    .requests
                    .into_iter()
                    .enumerate()
                    .filter(|(index, _)| !report.succeeded.contains(index))
                    .map(|(_, request)| request)
                    .collect();
            }
            Err(e) => self.report_error(&e).await,
        }
    }

    async fn report_error(&self, message: &str) {
        warn!("{}", message);
        let _ = self
            .sender
            .send(BackendEvent::Error(message.to_string()))
            .await;
    }
}
