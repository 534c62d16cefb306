//! Connection tracking for WebSocket clients.

pub mod client;
pub mod manager;

pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
pub type ConnectionId = usize;
