//! Connection manager for tracking client connections.

use super::{client::ClientConnection, ConnectionId};
use crate::error::ServerError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Central registry of live connections.
///
/// Assigns connection IDs from an atomic counter and enforces the
/// configured connection limit at registration time.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,

    /// Atomic counter for generating unique connection IDs
    next_id: AtomicUsize,

    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicUsize::new(1),
            max_connections,
        }
    }

    /// Registers a connection, or refuses it when the server is full.
    pub async fn add_connection(&self, remote_addr: SocketAddr) -> Result<ConnectionId, ServerError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.max_connections {
            warn!(
                "🚫 Refusing {}: connection limit {} reached",
                remote_addr, self.max_connections
            );
            return Err(ServerError::Network(format!(
                "connection limit {} reached",
                self.max_connections
            )));
        }

        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        connections.insert(connection_id, ClientConnection::new(remote_addr));
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        Ok(connection_id)
    }

    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.remove(&connection_id) {
            info!(
                "❌ Connection {} from {} closed after {}s ({} request(s))",
                connection_id,
                connection.remote_addr,
                connection.age_secs(),
                connection.requests_handled
            );
        }
    }

    /// Counts a handled request against the connection.
    pub async fn record_request(&self, connection_id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.requests_handled += 1;
            debug!(
                "📊 Connection {} handled {} request(s)",
                connection_id, connection.requests_handled
            );
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn remote_addr(&self, connection_id: ConnectionId) -> Option<SocketAddr> {
        self.connections
            .read()
            .await
            .get(&connection_id)
            .map(|connection| connection.remote_addr)
    }
}
