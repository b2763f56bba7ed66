mod common;

use common::{request, ScriptedFetcher, Step};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio::time::timeout;
use youdownload::backend::{BackendActor, BackendCommand, BackendEvent, ResumeMode};
use youdownload::downloader::FetchError;
use youdownload::queue::{BatchEvent, BatchOutcome, Orchestrator, RetryPolicy};

struct Harness {
    commands: mpsc::Sender<BackendCommand>,
    events: mpsc::Receiver<BackendEvent>,
}

fn spawn_actor(fetcher: Arc<ScriptedFetcher>, mode: ResumeMode) -> Harness {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::channel(1024);
    let orchestrator = Arc::new(Orchestrator::new(fetcher));
    tokio::spawn(BackendActor::new(orchestrator, mode, cmd_rx, event_tx).run());
    Harness {
        commands: cmd_tx,
        events: event_rx,
    }
}

impl Harness {
    /// Wait for the next BatchFinished, failing on backend errors
    async fn finished(&mut self) -> BatchOutcome {
        loop {
            let event = timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for batch")
                .expect("backend closed");
            match event {
                BackendEvent::Batch(BatchEvent::BatchFinished { outcome, .. }) => return outcome,
                BackendEvent::Error(e) => panic!("unexpected backend error: {}", e),
                _ => {}
            }
        }
    }

    async fn next_error(&mut self) -> String {
        loop {
            let event = timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for error")
                .expect("backend closed");
            if let BackendEvent::Error(e) = event {
                return e;
            }
        }
    }

    /// Wait until item `index` has started
    async fn started(&mut self, index: usize) {
        loop {
            let event = timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("timed out waiting for item")
                .expect("backend closed");
            if let BackendEvent::Batch(BatchEvent::ItemStarted { index: i, .. }) = event {
                if i == index {
                    return;
                }
            }
        }
    }
}

#[tokio::test]
async fn test_start_batch_runs_to_completion() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    let mut harness = spawn_actor(fetcher.clone(), ResumeMode::Restart);

    harness
        .commands
        .send(BackendCommand::StartBatch {
            requests: vec![request("a", dir.path()), request("b", dir.path())],
            policy: RetryPolicy::new(1, Duration::ZERO),
        })
        .await
        .unwrap();

    let outcome = harness.finished().await;
    assert_eq!(outcome.succeeded, 2);
    assert_eq!(fetcher.total_attempts(), 2);
}

#[tokio::test]
async fn test_stop_then_resume_restarts_whole_list() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new().script("b", vec![Step::Hang, Step::Succeed]),
    );
    let mut harness = spawn_actor(fetcher.clone(), ResumeMode::Restart);

    harness
        .commands
        .send(BackendCommand::StartBatch {
            requests: vec![request("a", dir.path()), request("b", dir.path())],
            policy: RetryPolicy::new(1, Duration::ZERO),
        })
        .await
        .unwrap();

    harness.started(1).await;
    harness.commands.send(BackendCommand::Stop).await.unwrap();
    let stopped = harness.finished().await;
    assert!(stopped.cancelled);
    assert_eq!(stopped.succeeded, 1);

    harness.commands.send(BackendCommand::Resume).await.unwrap();
    let resumed = harness.finished().await;
    assert_eq!(resumed.succeeded, 2);
    assert!(!resumed.cancelled);
    assert_eq!(fetcher.attempts("a"), 2);
    assert_eq!(fetcher.attempts("b"), 2);
}

#[tokio::test]
async fn test_resume_can_skip_completed_items() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(
        ScriptedFetcher::new().script("b", vec![Step::Hang, Step::Succeed]),
    );
    let mut harness = spawn_actor(fetcher.clone(), ResumeMode::SkipCompleted);

    harness
        .commands
        .send(BackendCommand::StartBatch {
            requests: vec![request("a", dir.path()), request("b", dir.path())],
            policy: RetryPolicy::new(1, Duration::ZERO),
        })
        .await
        .unwrap();

    harness.started(1).await;
    harness.commands.send(BackendCommand::Stop).await.unwrap();
    harness.finished().await;

    harness.commands.send(BackendCommand::Resume).await.unwrap();
    let resumed = harness.finished().await;
    assert_eq!(resumed.succeeded, 1);
    assert_eq!(fetcher.attempts("a"), 1);
    assert_eq!(fetcher.attempts("b"), 2);

    harness.commands.send(BackendCommand::Resume).await.unwrap();
    assert_eq!(harness.next_error().await, "Nothing to resume");
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().script("a", vec![Step::Hang]));
    let mut harness = spawn_actor(fetcher, ResumeMode::Restart);

    let start = BackendCommand::StartBatch {
        requests: vec![request("a", dir.path())],
        policy: RetryPolicy::new(1, Duration::ZERO),
    };
    harness.commands.send(start.clone()).await.unwrap();
    harness.started(0).await;
    harness.commands.send(start).await.unwrap();

    assert_eq!(harness.next_error().await, "A batch is already running");

    harness.commands.send(BackendCommand::Stop).await.unwrap();
    assert!(harness.finished().await.cancelled);
}

#[tokio::test]
async fn test_batch_errors_are_reported() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let mut harness = spawn_actor(fetcher.clone(), ResumeMode::Restart);

    harness
        .commands
        .send(BackendCommand::StartBatch {
            requests: Vec::new(),
            policy: RetryPolicy::new(1, Duration::ZERO),
        })
        .await
        .unwrap();

    assert_eq!(harness.next_error().await, "Batch contains no requests");
    assert_eq!(fetcher.total_attempts(), 0);
}

#[tokio::test]
async fn test_failed_items_do_not_block_resume() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().script(
        "b",
        vec![Step::Fail(FetchError::new("Video unavailable")), Step::Succeed],
    ));
    let mut harness = spawn_actor(fetcher.clone(), ResumeMode::SkipCompleted);

    harness
        .commands
        .send(BackendCommand::StartBatch {
            requests: vec![request("a", dir.path()), request("b", dir.path())],
            policy: RetryPolicy::new(3, Duration::ZERO),
        })
        .await
        .unwrap();
    let first = harness.finished().await;
    assert_eq!(first.failed.len(), 1);

    harness.commands.send(BackendCommand::Resume).await.unwrap();
    let second = harness.finished().await;
    assert_eq!(second.succeeded, 1);
    assert_eq!(fetcher.attempts("a"), 1);
}

#[tokio::test]
async fn test_shutdown_stops_running_batch() {
    let dir = tempdir().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new().script("a", vec![Step::Hang]));
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(1024);
    let actor = BackendActor::new(
        Arc::new(Orchestrator::new(fetcher)),
        ResumeMode::Restart,
        cmd_rx,
        event_tx,
    );
    let handle = tokio::spawn(actor.run());

    cmd_tx
        .send(BackendCommand::StartBatch {
            requests: vec![request("a", dir.path())],
            policy: RetryPolicy::new(1, Duration::ZERO),
        })
        .await
        .unwrap();
    cmd_tx.send(BackendCommand::Shutdown).await.unwrap();

    timeout(Duration::from_secs(5), handle)
        .await
        .expect("actor did not shut down")
        .unwrap();
    // Channel closes once the actor and its batch are gone
    while event_rx.recv().await.is_some() {}
}
