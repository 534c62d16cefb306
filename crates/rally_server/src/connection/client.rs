//! Per-connection bookkeeping.

use std::net::SocketAddr;
use std::time::SystemTime;

/// Represents an individual client connection to the server.
#[derive(Debug)]
pub struct ClientConnection {
    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: SystemTime,

    /// Requests answered on this connection so far
    pub requests_handled: u64,
}

impl ClientConnection {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            connected_at: SystemTime::now(),
            requests_handled: 0,
        }
    }

    /// Seconds since the connection was accepted.
    pub fn age_secs(&self) -> u64 {
        self.connected_at
            .elapsed()
            .map(|age| age.as_secs())
            .unwrap_or(0)
    }
}
