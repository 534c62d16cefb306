//! Core game server implementation.

use crate::{
    config::ServerConfig,
    connection::ConnectionManager,
    error::ServerError,
    server::handlers::{handle_connection, ConnectionContext},
};
use rally_core::{ProximityEngine, ShutdownState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The WebSocket front of the game.
///
/// Accepts connections, hands each to its own task and routes every request
/// to the shared [`ProximityEngine`]. The server holds no game state of its
/// own.
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    engine: Arc<ProximityEngine>,

    /// Manager for client connections
    connection_manager: Arc<ConnectionManager>,
}

impl GameServer {
    pub fn new(config: ServerConfig, engine: Arc<ProximityEngine>) -> Self {
        let connection_manager = Arc::new(ConnectionManager::new(config.max_connections));
        Self {
            config,
            engine,
            connection_manager,
        }
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address))
            })
    }

    /// Binds and serves until `shutdown_state` is triggered.
    pub async fn start_with_shutdown_state(
        &self,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_state).await
    }

    /// Runs the accept loop on an already bound listener.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_state: ShutdownState,
    ) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        info!("🚀 Game server listening on {}", local_addr);

        let context = ConnectionContext {
            connection_manager: self.connection_manager.clone(),
            engine: self.engine.clone(),
            max_message_size: self.config.max_message_size,
            enable_admin_routes: self.config.enable_admin_routes,
            shutdown: shutdown_state.clone(),
        };

        loop {
            tokio::select! {
                _ = shutdown_state.wait() => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let context = context.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, addr, context).await {
                                    error!("Connection error from {}: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            // Usually transient (e.g. out of file descriptors)
                            error!("Failed to accept connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }

        info!("✅ Server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind_address
    }

    pub fn engine(&self) -> Arc<ProximityEngine> {
        self.engine.clone()
    }

    pub async fn connection_count(&self) -> usize {
        self.connection_manager.connection_count().await
    }
}
