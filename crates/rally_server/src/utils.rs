//! Factory functions for server instances.

use crate::{config::ServerConfig, server::GameServer};
use rally_core::ProximityEngine;
use std::sync::Arc;

/// Creates a server with default network settings.
pub fn create_server(engine: Arc<ProximityEngine>) -> GameServer {
    GameServer::new(ServerConfig::default(), engine)
}

/// Creates a server with custom network settings.
///
/// ```rust
/// use rally_core::{
///     GameRules, MemoryIdentityResolver, MemoryPositionStore, MemoryPostStore,
///     ProximityEngine, SystemClock,
/// };
/// use rally_server::{create_server_with_config, ServerConfig};
/// use std::sync::Arc;
///
/// let engine = Arc::new(ProximityEngine::new(
///     Arc::new(MemoryPositionStore::default()),
///     Arc::new(MemoryPostStore::new()),
///     Arc::new(MemoryIdentityResolver::new()),
///     Arc::new(SystemClock),
///     GameRules::default(),
/// ));
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     max_connections: 5000,
///     ..Default::default()
/// };
/// let server = create_server_with_config(config, engine);
/// assert_eq!(server.config().max_connections, 5000);
/// ```
pub fn create_server_with_config(config: ServerConfig, engine: Arc<ProximityEngine>) -> GameServer {
    GameServer::new(config, engine)
}
