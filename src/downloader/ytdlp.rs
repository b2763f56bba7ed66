//! Fetcher backed by the yt-dlp binary
//!
//! Each attempt spawns one yt-dlp process. Progress is read from stdout
//! (`--newline` keeps one report per line) and the final `ERROR:` line of
//! stderr becomes the attempt's error message.

use crate::downloader::fetcher::{FetchError, Fetcher};
use crate::downloader::progress::TransferProgress;
use crate::queue::DownloadRequest;
use crate::utils::tools::Toolchain;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Options forwarded to yt-dlp on every attempt
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// `--http-chunk-size` in bytes
    pub chunk_size: u64,
    /// yt-dlp's own `--retries` / `--fragment-retries`
    pub internal_retries: u32,
    /// Output template relative to the request's target directory
    pub output_template: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            chunk_size: 10 * 1024 * 1024,
            internal_retries: 10,
            output_template: "%(title)s.%(ext)s".to_string(),
        }
    }
}

/// yt-dlp process wrapper implementing [`Fetcher`]
pub struct YtDlpFetcher {
    ytdlp_path: PathBuf,
    ffmpeg_path: PathBuf,
    options: FetchOptions,
}

impl YtDlpFetcher {
    pub fn new(toolchain: &Toolchain, options: FetchOptions) -> Self {
        Self {
            ytdlp_path: toolchain.ytdlp.clone(),
            ffmpeg_path: toolchain.ffmpeg.clone(),
            options,
        }
    }

    /// Command-line arguments for one attempt at `request`
    pub fn build_args(&self, request: &DownloadRequest) -> Vec<String> {
        let output = request.target_dir.join(&self.options.output_template);
        let mut args = vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--continue".to_string(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "-f".to_string(),
            request.quality.format_selector(),
            "--http-chunk-size".to_string(),
            self.options.chunk_size.to_string(),
            "--retries".to_string(),
            self.options.internal_retries.to_string(),
            "--fragment-retries".to_string(),
            self.options.internal_retries.to_string(),
            "--ffmpeg-location".to_string(),
            self.ffmpeg_path.to_string_lossy().into_owned(),
        ];

        if request.quality.is_audio_only() {
            args.extend(
                ["-x", "--audio-format", "mp3", "--audio-quality", "192K"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }

        args.push("--".to_string());
        args.push(request.source.clone());
        args
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
        cancel: CancellationToken,
    ) -> Result<(), FetchError> {
        let args = self.build_args(request);
        debug!("Running {:?} {:?}", self.ytdlp_path, args);

        let mut command = AsyncCommand::new(&self.ytdlp_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Terminal Ctrl-C must reach only us; the child stops via `cancel`
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| FetchError::fatal(format!("Failed to start yt-dlp: {}", e)))?;

        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(last_error_line(stderr)));
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::fatal("yt-dlp stdout unavailable"))?;
        let mut lines = BufReader::new(stdout).lines();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    if let Err(e) = child.start_kill() {
                        warn!("Failed to stop yt-dlp: {}", e);
                    }
                    let _ = child.wait().await;
                    return Err(FetchError::fatal("Download stopped"));
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if let Some(snapshot) = parse_progress_line(&line) {
                            let _ = progress.send(snapshot).await;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read yt-dlp output: {}", e);
                        break;
                    }
                },
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| FetchError::new(format!("Failed to wait for yt-dlp: {}", e)))?;

        if status.success() {
            return Ok(());
        }

        let reported = match stderr_task {
            Some(task) => task.await.ok().flatten(),
            None => None,
        };
        Err(FetchError::new(reported.unwrap_or_else(|| {
            format!("yt-dlp exited with {}", status)
        })))
    }
}

/// Drain a stream and keep the most relevant error line
async fn last_error_line<R: AsyncRead + Unpin>(reader: R) -> Option<String> {
    let mut lines = BufReader::new(reader).lines();
    let mut last_error = None;
    let mut last_line = None;

    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(message) = trimmed.strip_prefix("ERROR:") {
            last_error = Some(message.trim().to_string());
        }
        last_line = Some(trimmed.to_string());
    }

    last_error.or(last_line)
}

/// Parse a yt-dlp progress line
///
/// Expected format: `[download]  42.5% of ~ 150.00MiB at  5.20MiB/s ETA 00:15`
pub fn parse_progress_line(line: &str) -> Option<TransferProgress> {
    let body = line.trim_start().strip_prefix("[download]")?;
    let pct_pos = body.find('%')?;
    let pct = body[..pct_pos].trim().parse::<f64>().ok()?;

    let total_bytes = body.find(" of ").and_then(|idx| {
        let after = body[idx + 4..].trim_start().trim_start_matches('~').trim_start();
        let end = after.find(char::is_whitespace).unwrap_or(after.len());
        parse_size(&after[..end]).map(|size| size as u64)
    });

    let speed = body
        .find(" at ")
        .and_then(|idx| {
            let after = body[idx + 4..].trim_start();
            after.find("/s").and_then(|end| parse_size(&after[..end]))
        })
        .unwrap_or(0.0);

    let downloaded = total_bytes
        .map(|total| (total as f64 * pct / 100.0).round() as u64)
        .unwrap_or(0);

    let mut progress = TransferProgress::new(0, total_bytes);
    progress.update(downloaded, speed);
    Some(progress)
}

/// Parse sizes such as `150.00MiB`, `812KiB`, `3.1GiB` or `512B` into bytes
fn parse_size(token: &str) -> Option<f64> {
    let token = token.trim();
    let idx = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    if idx == 0 {
        return None;
    }

    let num = token[..idx].parse::<f64>().ok()?;
    let multiplier = match token[idx..].trim() {
        "B" | "" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        "KB" => 1000.0,
        "MB" => 1000.0 * 1000.0,
        "GB" => 1000.0 * 1000.0 * 1000.0,
        _ => return None,
    };
    Some(num * multiplier)
}
