//! Server configuration types and defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Network settings for the WebSocket server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Largest accepted text frame, in bytes
    pub max_message_size: usize,

    /// Serve `admin:*` routes. Only enable on a listener reachable by
    /// trusted operators; any connected client can call them.
    #[serde(default)]
    pub enable_admin_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_connections: 1000,
            max_message_size: 64 * 1024, // 64KB
            enable_admin_routes: false,
        }
    }
}
