//! In-memory position store.

use super::{Lifecycle, PositionStore};
use crate::error::{GeoError, GeoResult};
use crate::eviction::EvictionPolicy;
use crate::geo::{validate_radius, Coordinates};
use crate::spatial::ShardedGeoIndex;
use crate::types::{Position, PositionUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Default number of index shards.
pub const DEFAULT_INDEX_SHARDS: usize = 16;

/// Position store backed by a sharded R*-tree.
///
/// Upserts for one identity are serialized by that identity's shard lock, so
/// the index never holds two records for the same identity. Reads filter out
/// records older than the eviction policy's TTL.
#[derive(Debug)]
pub struct MemoryPositionStore {
    index: ShardedGeoIndex<Position>,
    policy: EvictionPolicy,
    lifecycle: Lifecycle,
}

impl MemoryPositionStore {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self::with_shards(policy, DEFAULT_INDEX_SHARDS)
    }

    pub fn with_shards(policy: EvictionPolicy, shards: usize) -> Self {
        Self {
            index: ShardedGeoIndex::new(shards),
            policy,
            lifecycle: Lifecycle::new("position"),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }
}

impl Default for MemoryPositionStore {
    fn default() -> Self {
        Self::new(EvictionPolicy::default())
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    async fn upsert(&self, update: PositionUpdate, now: DateTime<Utc>) -> GeoResult<Position> {
        self.lifecycle.ensure_open()?;
        update.coordinates.validate()?;
        if update.identity.is_empty() {
            return Err(GeoError::InvalidArgument("identity must not be empty".to_string()));
        }

        let PositionUpdate {
            identity,
            display_name,
            coordinates,
        } = update;

        // A stale record counts as absent, swept or not
        let policy = self.policy;
        let stored = self
            .index
            .upsert_with(&identity, |previous| {
                let display_name = display_name.or_else(|| {
                    previous
                        .filter(|p| policy.is_fresh(p.last_updated, now))
                        .and_then(|p| p.display_name.clone())
                });
                let position = Position {
                    identity: identity.clone(),
                    display_name,
                    coordinates,
                    last_updated: now,
                };
                (coordinates, position)
            })
            .await;

        debug!(
            "📍 Stored position for '{}' at ({}, {})",
            stored.identity, stored.coordinates.longitude, stored.coordinates.latitude
        );
        Ok(stored)
    }

    async fn find_within_radius(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        exclude_identity: &str,
        now: DateTime<Utc>,
    ) -> GeoResult<Vec<Position>> {
        self.lifecycle.ensure_open()?;
        center.validate()?;
        validate_radius(radius_meters)?;

        let policy = self.policy;
        let hits = self
            .index
            .within_radius(center, radius_meters, |identity, position| {
                identity != exclude_identity && policy.is_fresh(position.last_updated, now)
            })
            .await;

        Ok(hits.into_iter().map(|hit| hit.value).collect())
    }

    async fn get(&self, identity: &str, now: DateTime<Utc>) -> GeoResult<Option<Position>> {
        self.lifecycle.ensure_open()?;
        Ok(self
            .index
            .get(identity)
            .await
            .filter(|position| self.policy.is_fresh(position.last_updated, now)))
    }

    async fn evict_stale(&self, now: DateTime<Utc>) -> GeoResult<usize> {
        self.lifecycle.ensure_open()?;
        let policy = self.policy;
        Ok(self
            .index
            .retain(|_, position| policy.is_fresh(position.last_updated, now))
            .await)
    }

    async fn len(&self) -> GeoResult<usize> {
        self.lifecycle.ensure_open()?;
        Ok(self.index.len().await)
    }

    async fn close(&self) {
        if self.lifecycle.close() {
            info!("📦 Position store closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn origin() -> Coordinates {
        Coordinates::new(12.48, 55.77).unwrap()
    }

    fn update(identity: &str, name: Option<&str>, coordinates: Coordinates) -> PositionUpdate {
        PositionUpdate {
            identity: identity.to_string(),
            display_name: name.map(str::to_string),
            coordinates,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_record() {
        let store = MemoryPositionStore::default();
        let now = Utc::now();

        store.upsert(update("t1", Some("Team1"), origin()), now).await.unwrap();
        let moved = origin().offset_north(200.0);
        let second = store
            .upsert(update("t1", Some("Team One"), moved), now + Duration::seconds(1))
            .await
            .unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(second.display_name.as_deref(), Some("Team One"));
        assert_eq!(second.coordinates, moved);
        assert_eq!(second.last_updated, now + Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_upsert_without_name_keeps_existing_name() {
        let store = MemoryPositionStore::default();
        let now = Utc::now();

        store.upsert(update("t1", Some("Team1"), origin()), now).await.unwrap();
        let updated = store.upsert(update("t1", None, origin()), now).await.unwrap();
        assert_eq!(updated.display_name.as_deref(), Some("Team1"));

        let fresh = store.upsert(update("t9", None, origin()), now).await.unwrap();
        assert_eq!(fresh.display_name, None);
    }

    #[tokio::test]
    async fn test_upsert_without_name_ignores_stale_record() {
        let store = MemoryPositionStore::default();
        let now = Utc::now();

        store.upsert(update("t1", Some("Team1"), origin()), now).await.unwrap();
        let later = now + Duration::seconds(120);
        assert!(store.get("t1", later).await.unwrap().is_none());

        let updated = store.upsert(update("t1", None, origin()), later).await.unwrap();
        assert_eq!(updated.display_name, None);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_excludes_self_and_stale() {
        let store = MemoryPositionStore::default();
        let now = Utc::now();

        store.upsert(update("me", None, origin()), now).await.unwrap();
        store.upsert(update("fresh", None, origin().offset_north(5.0)), now).await.unwrap();
        store
            .upsert(update("stale", None, origin().offset_north(6.0)), now - Duration::seconds(45))
            .await
            .unwrap();

        let found = store.find_within_radius(&origin(), 50.0, "me", now).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.identity.as_str()).collect();
        assert_eq!(ids, vec!["fresh"]);

        assert!(store.get("stale", now).await.unwrap().is_none());
        assert_eq!(store.evict_stale(now).await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let store = MemoryPositionStore::default();
        let bad_center = Coordinates {
            longitude: 200.0,
            latitude: 0.0,
        };

        let err = store
            .find_within_radius(&bad_center, 10.0, "me", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));

        let err = store
            .find_within_radius(&origin(), -1.0, "me", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));

        let err = store
            .upsert(update("", None, origin()), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_closed_store_is_unavailable() {
        let store = MemoryPositionStore::default();
        store.close().await;

        let err = store
            .upsert(update("t1", None, origin()), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Unavailable(_)));
        assert!(matches!(store.len().await, Err(GeoError::Unavailable(_))));
    }
}
