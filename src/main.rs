//! YouDownload - terminal video downloader
//!
//! Drives yt-dlp one item at a time with bounded retries on network errors,
//! playlist expansion, and Ctrl-C to stop a batch cleanly.

use anyhow::Result;
use clap::Parser;
use youdownload::cli::{self, Cli};

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    let success = rt.block_on(cli::run(args))?;

    if !success {
        std::process::exit(1);
    }
    Ok(())
}
