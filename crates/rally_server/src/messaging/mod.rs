//! Message parsing and routing between clients and the engine.

pub mod router;
pub mod types;

pub use router::route_client_message;
pub use types::{ClientMessage, ErrorBody, ServerMessage};
