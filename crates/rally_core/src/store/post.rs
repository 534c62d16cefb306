//! In-memory post store.

use super::{Lifecycle, PostStore};
use crate::error::{GeoError, GeoResult};
use crate::geo::{distance_meters, validate_radius, Coordinates};
use crate::spatial::ShardedGeoIndex;
use crate::types::Post;
use async_trait::async_trait;
use tracing::{debug, info};

/// Distance in meters at which a team counts as having reached a post.
pub const DEFAULT_REACH_RADIUS_METERS: f64 = 10.0;

/// Post store backed by a sharded R*-tree keyed by post id.
#[derive(Debug)]
pub struct MemoryPostStore {
    index: ShardedGeoIndex<Post>,
    lifecycle: Lifecycle,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::with_shards(super::position::DEFAULT_INDEX_SHARDS)
    }

    pub fn with_shards(shards: usize) -> Self {
        Self {
            index: ShardedGeoIndex::new(shards),
            lifecycle: Lifecycle::new("post"),
        }
    }
}

impl Default for MemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn get(&self, id: &str) -> GeoResult<Post> {
        self.lifecycle.ensure_open()?;
        self.index
            .get(id)
            .await
            .ok_or_else(|| GeoError::post_not_found(id))
    }

    async fn find_reachable(
        &self,
        id: &str,
        point: &Coordinates,
        reach_radius_meters: f64,
    ) -> GeoResult<Post> {
        point.validate()?;
        validate_radius(reach_radius_meters)?;
        let post = self.get(id).await?;

        let distance = distance_meters(&post.coordinates, point);
        if distance > reach_radius_meters {
            debug!(
                "🚩 Post '{}' not reached: {:.1}m away (reach {:.1}m)",
                id, distance, reach_radius_meters
            );
            return Err(GeoError::NotReached {
                post_id: id.to_string(),
                distance_meters: distance,
            });
        }

        Ok(post)
    }

    async fn create(&self, post: Post) -> GeoResult<Post> {
        self.lifecycle.ensure_open()?;
        post.coordinates.validate()?;
        if post.id.is_empty() {
            return Err(GeoError::InvalidArgument("post id must not be empty".to_string()));
        }

        if !self
            .index
            .insert_if_absent(&post.id, post.coordinates, post.clone())
            .await
        {
            return Err(GeoError::AlreadyExists {
                entity: "post",
                id: post.id,
            });
        }

        info!(
            "🚩 Created post '{}' at ({}, {})",
            post.id, post.coordinates.longitude, post.coordinates.latitude
        );
        Ok(post)
    }

    async fn find_within_radius(
        &self,
        center: &Coordinates,
        radius_meters: f64,
    ) -> GeoResult<Vec<Post>> {
        self.lifecycle.ensure_open()?;
        center.validate()?;
        validate_radius(radius_meters)?;

        let hits = self.index.within_radius(center, radius_meters, |_, _| true).await;
        Ok(hits.into_iter().map(|hit| hit.value).collect())
    }

    async fn len(&self) -> GeoResult<usize> {
        self.lifecycle.ensure_open()?;
        Ok(self.index.len().await)
    }

    async fn close(&self) {
        if self.lifecycle.close() {
            info!("📦 Post store closed");
        }
    }
}
