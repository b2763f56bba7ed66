//! Advisory connectivity probe
//!
//! Opens a TCP connection to a few well-known public resolvers. The result is
//! shown to the user before a batch; it never gates retries.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Hosts tried in order
pub const PROBE_TARGETS: [&str; 3] = ["8.8.8.8:53", "1.1.1.1:53", "208.67.222.222:53"];

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Returns true if any default target accepts a connection
pub async fn check_connectivity() -> bool {
    let targets: Vec<SocketAddr> = PROBE_TARGETS
        .iter()
        .filter_map(|target| target.parse().ok())
        .collect();
    probe(&targets, PROBE_TIMEOUT).await
}

/// Returns true if any of `targets` accepts a TCP connection within `limit`
pub async fn probe(targets: &[SocketAddr], limit: Duration) -> bool {
    for target in targets {
        match timeout(limit, TcpStream::connect(target)).await {
            Ok(Ok(_)) => {
                debug!("Connectivity probe reached {}", target);
                return true;
            }
            Ok(Err(e)) => debug!("Connectivity probe to {} failed: {}", target, e),
            Err(_) => debug!("Connectivity probe to {} timed out", target),
        }
    }
    false
}
