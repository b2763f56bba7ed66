//! Command-line front end
//!
//! Plays the role of the UI thread: it starts batches on the backend actor,
//! forwards Ctrl-C as a stop request, offers to resume a stopped batch and
//! drains the event channel.

pub mod console;

use crate::backend::{BackendActor, BackendCommand, BackendEvent, ResumeMode};
use crate::downloader::{FetchOptions, YtDlpFetcher};
use crate::extractor::{self, Extractor, YtDlpExtractor};
use crate::queue::{BatchEvent, BatchOutcome, DownloadRequest, ErrorLog, Orchestrator, RetryPolicy};
use crate::utils::{self, AppSettings, Toolchain, VideoQuality, YouDownloadError};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::ConsoleView;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "youdownload", version, about = "Download videos and playlists via yt-dlp")]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Download one or more videos, or whole playlists
    Download(DownloadArgs),
    /// Show information about a video
    Info { url: String },
    /// List the entries of a playlist
    Playlist { url: String },
    /// Check internet connectivity
    Probe,
    /// Show or change saved settings
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DownloadArgs {
    /// Video URLs or ids
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// best, audio, or a maximum height such as 720p
    #[arg(short, long)]
    pub quality: Option<VideoQuality>,

    /// Target directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Expand playlist URLs into their entries
    #[arg(long)]
    pub playlist: bool,

    /// Attempts per item
    #[arg(long)]
    pub retries: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Remember the target directory for next time
    #[arg(long)]
    pub save_dir: bool,

    /// When resuming after Ctrl-C, skip items that already finished
    #[arg(long)]
    pub skip_completed: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// New default download directory
    #[arg(long)]
    pub set_dir: Option<PathBuf>,

    /// New default quality
    #[arg(long)]
    pub set_quality: Option<VideoQuality>,
}

/// Run the parsed command line; returns false if any item failed
pub async fn run(cli: Cli) -> Result<bool> {
    let settings_path = cli.settings.unwrap_or_else(AppSettings::default_path);
    let mut settings = AppSettings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {:?}", settings_path))?;

    match cli.command {
        Command::Download(args) => download(args, &mut settings, &settings_path).await,
        Command::Info { url } => {
            let toolchain = Toolchain::discover()?;
            let info = YtDlpExtractor::new(toolchain.ytdlp)
                .extract_info(&validated(&url)?)
                .await?;
            println!("{}", info.describe());
            Ok(true)
        }
        Command::Playlist { url } => {
            let toolchain = Toolchain::discover()?;
            let entries = YtDlpExtractor::new(toolchain.ytdlp)
                .extract_playlist(&validated(&url)?)
                .await?;
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}. {} [{}]",
                    i + 1,
                    entry.display_title(),
                    extractor::format_duration(entry.duration)
                );
                if let Some(thumbnail) = entry.best_thumbnail() {
                    println!("     {}", thumbnail);
                }
            }
            Ok(true)
        }
        Command::Probe => {
            let reachable = utils::check_connectivity().await;
            println!(
                "{}",
                if reachable {
                    "✓ Internet connection available"
                } else {
                    "✗ No internet connection"
                }
            );
            Ok(reachable)
        }
        Command::Config(args) => {
            let changed = args.set_dir.is_some() || args.set_quality.is_some();
            if let Some(dir) = args.set_dir {
                settings.download_location = dir;
            }
            if let Some(quality) = args.set_quality {
                settings.quality = quality;
            }
            if changed {
                settings.save(&settings_path)?;
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(true)
        }
    }
}

async fn download(
    args: DownloadArgs,
    settings: &mut AppSettings,
    settings_path: &std::path::Path,
) -> Result<bool> {
    let toolchain = Toolchain::discover()?;

    let target_dir = args
        .output
        .clone()
        .unwrap_or_else(|| settings.download_location.clone());
    if args.save_dir {
        settings.download_location = target_dir.clone();
        settings.save(settings_path)?;
    }
    let quality = args.quality.unwrap_or(settings.quality);
    let policy = RetryPolicy::new(
        args.retries.unwrap_or(settings.retry_attempts),
        args.retry_delay
            .map(Duration::from_secs)
            .unwrap_or_else(|| settings.retry_delay()),
    );

    if !utils::check_connectivity().await {
        warn!("No internet connection detected, downloads may fail");
        eprintln!("⚠ No internet connection detected, downloads may fail");
    }

    let extractor = YtDlpExtractor::new(toolchain.ytdlp.clone());
    let mut requests = Vec::new();
    for url in &args.urls {
        let url = validated(url)?;
        if args.playlist && extractor::is_playlist_url(&url) {
            let entries = extractor.extract_playlist(&url).await?;
            info!("Playlist {} has {} entries", url, entries.len());
            requests.extend(extractor::expand_requests(&entries, &target_dir, quality));
        } else {
            requests.push(DownloadRequest::new(url, &target_dir, quality));
        }
    }

    let fetcher = YtDlpFetcher::new(
        &toolchain,
        FetchOptions {
            chunk_size: settings.chunk_size,
            internal_retries: settings.internal_retries,
            ..Default::default()
        },
    );
    let error_log = ErrorLog::open(&utils::error_log_path()).await?;
    let orchestrator = Orchestrator::new(Arc::new(fetcher)).with_error_log(Arc::new(error_log));

    let resume_mode = if args.skip_completed {
        ResumeMode::SkipCompleted
    } else {
        ResumeMode::Restart
    };
    let (stop_tx, stop_rx) = mpsc::channel(1);
    forward_ctrl_c(stop_tx);

    let outcome = drive(orchestrator, resume_mode, requests, policy, stop_rx, ask_resume).await?;
    Ok(outcome
        .map(|outcome| outcome.failed.is_empty() && !outcome.cancelled)
        .unwrap_or(false))
}

/// Run a batch on the backend actor, rendering events until it finishes.
///
/// Each message on `stops` asks the running batch to stop. Once a stopped
/// batch has finished, `confirm_resume` decides whether to send `Resume`.
/// Returns the outcome of the last batch run, if any.
pub async fn drive(
    orchestrator: Orchestrator,
    resume_mode: ResumeMode,
    requests: Vec<DownloadRequest>,
    policy: RetryPolicy,
    mut stops: mpsc::Receiver<()>,
    mut confirm_resume: impl FnMut() -> bool,
) -> Result<Option<BatchOutcome>> {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let actor = BackendActor::new(Arc::new(orchestrator), resume_mode, cmd_rx, event_tx);
    let actor_handle = tokio::spawn(actor.run());

    cmd_tx
        .send(BackendCommand::StartBatch { requests, policy })
        .await?;

    let mut view = ConsoleView::new();
    let mut stop_requested = false;
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let finished = matches!(
                    &event,
                    BackendEvent::Batch(BatchEvent::BatchFinished { .. })
                );
                if view.handle(event) {
                    continue;
                }

                let stopped = view.outcome().is_some_and(|outcome| outcome.cancelled);
                if !(finished && stop_requested && stopped && confirm_resume()) {
                    break;
                }
                // Stop requests that arrived while the batch was winding down
                while stops.try_recv().is_ok() {}
                stop_requested = false;
                info!("Resuming stopped batch ({:?})", resume_mode);
                cmd_tx.send(BackendCommand::Resume).await?;
            }
            Some(()) = stops.recv(), if !stop_requested => {
                eprintln!("Stopping after the current step...");
                stop_requested = true;
                cmd_tx.send(BackendCommand::Stop).await?;
            }
        }
    }

    cmd_tx.send(BackendCommand::Shutdown).await?;
    // Keep draining so the actor can finish sending
    while event_rx.recv().await.is_some() {}
    actor_handle.await?;

    Ok(view.outcome().cloned())
}

/// Forward every Ctrl-C to `stops` until the receiver goes away
fn forward_ctrl_c(stops: mpsc::Sender<()>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if stops.is_closed() {
                break;
            }
            let _ = stops.try_send(());
        }
    });
}

/// Ask on the terminal whether a stopped batch should continue
fn ask_resume() -> bool {
    tokio::task::block_in_place(|| {
        eprint!("Batch stopped. Resume? [y/N] ");
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        match std::io::stdin().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    })
}

fn validated(url: &str) -> Result<String, YouDownloadError> {
    let url = url.trim();
    if extractor::is_supported_url(url) {
        Ok(url.to_string())
    } else {
        Err(YouDownloadError::InvalidUrl(url.to_string()))
    }
}
