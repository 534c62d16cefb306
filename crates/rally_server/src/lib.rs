//! # Rally Server
//!
//! WebSocket transport for the Rally game. The server owns networking only;
//! every game rule lives in [`rally_core::ProximityEngine`].
//!
//! ## Message Flow
//!
//! 1. Client sends a text frame `{id?, namespace, event, data}`
//! 2. The router decodes `data` for the `namespace:event` route
//! 3. The matching engine operation runs
//! 4. Exactly one reply `{id?, event, ok, data | error}` goes back, in order
//!
//! ## Routes
//!
//! * `game:nearby_players` - authenticated report, returns nearby teams
//! * `game:update_position` - unauthenticated report, returns the stored position
//! * `game:post_reached` - returns a post's task when the caller is close enough
//! * `admin:add_post` - creates a post
//!
//! ## Error Handling
//!
//! Game failures are returned as `error {kind, code, message}` using
//! [`rally_core::GeoError::kind`] and [`rally_core::GeoError::status_code`].
//! Malformed frames and unknown routes get `kind: "protocol"`. Failures of the
//! server itself are [`ServerError`]s.

pub use config::ServerConfig;
pub use error::ServerError;
pub use messaging::{ClientMessage, ErrorBody, ServerMessage};
pub use server::GameServer;
pub use utils::{create_server, create_server_with_config};

pub mod config;
pub mod error;
pub mod messaging;
pub mod server;
pub mod utils;

mod connection;
