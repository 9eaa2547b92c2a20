//! Raw TCP reachability probe

use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// True when a TCP connection to `host:port` opens within `timeout`.
/// Refusals, DNS failures and timeouts all read as unreachable.
pub async fn tcp_reachable(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(host, port, "TCP probe refused: {}", e);
            false
        }
        Err(_) => {
            debug!(host, port, "TCP probe timed out after {:?}", timeout);
            false
        }
    }
}
