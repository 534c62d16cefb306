//! Transport error types.
//!
//! Game-level failures travel as [`rally_core::GeoError`] inside replies;
//! these variants cover what goes wrong around them.

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding, accepting or WebSocket failures
    #[error("Network error: {0}")]
    Network(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// The client sent something that is not a valid request
    #[error("Protocol error: {0}")]
    Protocol(String),
}
