//! Sharded geo index for concurrent writers
use super::index::{by_distance, GeoIndex, IndexHit};
use crate::geo::Coordinates;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;

/// A fixed set of [`GeoIndex`] shards, each behind its own lock.
///
/// A key always maps to the same shard, so every write for one key is
/// serialized by that shard's write lock while writes for keys in other
/// shards proceed in parallel. Radius queries read-lock one shard at a time
/// and merge the results, so a query may observe some concurrent writes and
/// not others.
///
/// Contention is per shard, not per key: two identities that hash to the
/// same shard briefly wait on each other's write lock.
#[derive(Debug)]
pub struct ShardedGeoIndex<T> {
    shards: Vec<RwLock<GeoIndex<T>>>,
}

impl<T: Clone> ShardedGeoIndex<T> {
    /// Creates an index with `shard_count` shards (at least one).
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count).map(|_| RwLock::new(GeoIndex::new())).collect(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_for(&self, key: &str) -> &RwLock<GeoIndex<T>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let slot = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[slot]
    }

    /// Atomically replaces the entry for `key`.
    ///
    /// `build` receives the current value (if any) and returns the new value
    /// together with its coordinates. It runs under the shard's write lock, so
    /// no other write for the same key can interleave.
    pub async fn upsert_with<F>(&self, key: &str, build: F) -> T
    where
        F: FnOnce(Option<&T>) -> (Coordinates, T),
    {
        let mut shard = self.shard_for(key).write().await;
        let (coordinates, value) = build(shard.get(key));
        shard.upsert(key, coordinates, value.clone());
        value
    }

    /// Inserts `value` only if `key` is vacant. Returns false when occupied.
    pub async fn insert_if_absent(&self, key: &str, coordinates: Coordinates, value: T) -> bool {
        let mut shard = self.shard_for(key).write().await;
        if shard.contains(key) {
            return false;
        }
        shard.upsert(key, coordinates, value);
        true
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let shard = self.shard_for(key).read().await;
        shard.get(key).cloned()
    }

    pub async fn remove(&self, key: &str) -> Option<T> {
        let mut shard = self.shard_for(key).write().await;
        shard.remove(key)
    }

    /// Radius query across all shards, nearest first.
    pub async fn within_radius<F>(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        mut filter: F,
    ) -> Vec<IndexHit<T>>
    where
        F: FnMut(&str, &T) -> bool,
    {
        let mut results = Vec::new();
        for shard in &self.shards {
            let shard = shard.read().await;
            results.extend(shard.within_radius(center, radius_meters, &mut filter));
        }
        results.sort_by(by_distance);
        results
    }

    /// Removes every entry rejected by `keep`, shard by shard.
    pub async fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str, &T) -> bool,
    {
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = shard.write().await;
            removed += shard.retain(&mut keep);
        }
        removed
    }

    /// Rebuilds every shard's tree.
    pub async fn rebuild(&self) {
        for shard in &self.shards {
            shard.write().await.rebuild();
        }
    }

    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.read().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn origin() -> Coordinates {
        Coordinates::new(12.48, 55.77).unwrap()
    }

    #[tokio::test]
    async fn test_query_merges_shards_in_distance_order() {
        let index = ShardedGeoIndex::new(4);
        for i in 0..20u32 {
            let key = format!("team{i}");
            index
                .upsert_with(&key, |_| (origin().offset_north(i as f64 * 10.0), i))
                .await;
        }

        let hits = index.within_radius(&origin(), 95.0, |_, _| true).await;
        let values: Vec<u32> = hits.iter().map(|h| h.value).collect();
        assert_eq!(values, (0..10).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn test_upsert_with_sees_previous_value() {
        let index = ShardedGeoIndex::new(2);
        index.upsert_with("t1", |_| (origin(), 1u32)).await;
        let next = index
            .upsert_with("t1", |prev| (origin(), prev.copied().unwrap_or(0) + 1))
            .await;

        assert_eq!(next, 2);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_if_absent() {
        let index = ShardedGeoIndex::new(2);
        assert!(index.insert_if_absent("post", origin(), 1u32).await);
        assert!(!index.insert_if_absent("post", origin(), 2u32).await);
        assert_eq!(index.get("post").await, Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_keep_one_entry_per_key() {
        let index = Arc::new(ShardedGeoIndex::new(8));
        let mut handles = Vec::new();

        for writer in 0..8u32 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                for round in 0..50u32 {
                    let key = format!("team{}", round % 5);
                    index
                        .upsert_with(&key, |_| (origin().offset_north(writer as f64), writer))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(index.len().await, 5);
        assert_eq!(index.within_radius(&origin(), 100.0, |_, _| true).await.len(), 5);
    }
}
