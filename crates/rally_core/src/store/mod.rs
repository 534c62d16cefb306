//! Storage contracts for positions and posts, with in-memory backends.
//!
//! Both stores are shared by every caller for the life of the process. They
//! are created explicitly, handed to the engine at construction time and torn
//! down with `close()`, after which every call fails with
//! [`GeoError::Unavailable`].

use crate::error::{GeoError, GeoResult};
use crate::geo::Coordinates;
use crate::types::{Position, PositionUpdate, Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

pub mod position;
pub mod post;

pub use position::MemoryPositionStore;
pub use post::{MemoryPostStore, DEFAULT_REACH_RADIUS_METERS};

/// Keyed, geo-indexed, time-to-live store of one position per identity.
#[async_trait]
pub trait PositionStore: Send + Sync + std::fmt::Debug {
    /// Replaces the record for `update.identity` (creating it if absent),
    /// stamped with `now`. Atomic per identity.
    async fn upsert(&self, update: PositionUpdate, now: DateTime<Utc>) -> GeoResult<Position>;

    /// Fresh positions within `radius_meters` of `center`, excluding
    /// `exclude_identity`, nearest first.
    async fn find_within_radius(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        exclude_identity: &str,
        now: DateTime<Utc>,
    ) -> GeoResult<Vec<Position>>;

    /// The fresh record for `identity`, if any.
    async fn get(&self, identity: &str, now: DateTime<Utc>) -> GeoResult<Option<Position>>;

    /// Physically removes stale records. Returns how many were removed.
    async fn evict_stale(&self, now: DateTime<Utc>) -> GeoResult<usize>;

    /// Number of physically stored records, stale ones included.
    async fn len(&self) -> GeoResult<usize>;

    /// Ends the store's lifecycle.
    async fn close(&self);
}

/// Keyed, geo-indexed store of static posts.
#[async_trait]
pub trait PostStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, id: &str) -> GeoResult<Post>;

    /// Returns the post when `point` is within `reach_radius_meters` of it.
    /// Fails with `NotFound` for an unknown id and `NotReached` when too far.
    async fn find_reachable(
        &self,
        id: &str,
        point: &Coordinates,
        reach_radius_meters: f64,
    ) -> GeoResult<Post>;

    /// Adds a post. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, post: Post) -> GeoResult<Post>;

    /// Posts within `radius_meters` of `center`, nearest first.
    async fn find_within_radius(&self, center: &Coordinates, radius_meters: f64)
        -> GeoResult<Vec<Post>>;

    async fn len(&self) -> GeoResult<usize>;

    async fn close(&self);
}

/// Open/closed flag shared by the in-memory stores.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    name: &'static str,
    open: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            open: AtomicBool::new(true),
        }
    }

    pub(crate) fn ensure_open(&self) -> GeoResult<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(GeoError::Unavailable(format!("{} store is closed", self.name)))
        }
    }

    /// Returns true if this call performed the close.
    pub(crate) fn close(&self) -> bool {
        self.open.swap(false, Ordering::AcqRel)
    }
}
