//! # Rally Core
//!
//! Geospatial core of the Rally location game. Teams report where they are,
//! see which other teams are close by, and unlock posts by physically
//! standing next to them.
//!
//! ## Building blocks
//!
//! - [`geo`] - validated coordinates and great-circle distances
//! - [`spatial`] - keyed R*-tree index, sharded for concurrent writers
//! - [`store`] - position and post stores behind async traits
//! - [`eviction`] - freshness window and the background sweeper
//! - [`identity`] - identity lookup and credential checks
//! - [`engine`] - the public game operations
//!
//! ## Example
//!
//! ```rust
//! use rally_core::{
//!     Coordinates, GameRules, MemoryIdentityResolver, MemoryPositionStore,
//!     MemoryPostStore, ProximityEngine, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let identities = MemoryIdentityResolver::new();
//! identities.add_user("team1", "Team One", "secret");
//!
//! let engine = ProximityEngine::new(
//!     Arc::new(MemoryPositionStore::default()),
//!     Arc::new(MemoryPostStore::new()),
//!     Arc::new(identities),
//!     Arc::new(SystemClock),
//!     GameRules::default(),
//! );
//!
//! let here = Coordinates::new(12.48, 55.77).unwrap();
//! let nearby = engine
//!     .report_and_find_nearby("team1", "secret", here, 100.0)
//!     .await
//!     .unwrap();
//! assert!(nearby.is_empty());
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod eviction;
pub mod geo;
pub mod identity;
pub mod shutdown;
pub mod spatial;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GameRules;
pub use engine::ProximityEngine;
pub use error::{GeoError, GeoResult};
pub use eviction::{
    EvictionPolicy, EvictionSweeper, DEFAULT_FRESHNESS_WINDOW_SECS, MAX_FRESHNESS_WINDOW_SECS,
};
pub use self::geo::{distance_meters, within_radius, Coordinates, EARTH_RADIUS_METERS};
pub use identity::{IdentityResolver, MemoryIdentityResolver};
pub use shutdown::ShutdownState;
pub use store::{
    MemoryPositionStore, MemoryPostStore, PositionStore, PostStore, DEFAULT_REACH_RADIUS_METERS,
};
pub use types::{NearbyPlayer, Position, PositionUpdate, PositionView, Post, PostTask, Task, UserRecord};
