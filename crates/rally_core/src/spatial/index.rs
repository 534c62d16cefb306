//! R*-tree backed geo index
//!
//! Keyed index holding at most one entry per key. Entries are stored as 3-D
//! points on a sphere of Earth radius so that `rstar`'s Euclidean queries can
//! pre-filter candidates; the final radius test always uses the haversine
//! distance.

use crate::geo::{chord_radius, distance_meters, Coordinates};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Entry stored inside the R-tree.
#[derive(Debug, Clone)]
struct IndexEntry<T> {
    key: String,
    coordinates: Coordinates,
    point: [f64; 3],
    value: T,
}

impl<T> IndexEntry<T> {
    fn new(key: String, coordinates: Coordinates, value: T) -> Self {
        let point = coordinates.to_sphere_point();
        Self {
            key,
            coordinates,
            point,
            value,
        }
    }
}

impl<T> PartialEq for IndexEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> RTreeObject for IndexEntry<T> {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl<T> PointDistance for IndexEntry<T> {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// A radius query match.
#[derive(Debug, Clone)]
pub struct IndexHit<T> {
    pub key: String,
    pub coordinates: Coordinates,
    pub value: T,
    /// Great-circle distance from the query center, in meters
    pub distance: f64,
}

/// Orders hits nearest first, breaking ties by key so results are stable.
pub(crate) fn by_distance<T>(a: &IndexHit<T>, b: &IndexHit<T>) -> Ordering {
    a.distance
        .partial_cmp(&b.distance)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.key.cmp(&b.key))
}

/// Counters for monitoring index activity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStats {
    pub total_insertions: usize,
    pub total_removals: usize,
    pub total_rebuilds: usize,
}

/// Keyed R*-tree over geographic coordinates
#[derive(Debug)]
pub struct GeoIndex<T> {
    tree: RTree<IndexEntry<T>>,
    /// Current entry per key, used to locate the tree entry on replace/remove
    entries: HashMap<String, IndexEntry<T>>,
    stats: IndexStats,
}

impl<T: Clone> GeoIndex<T> {
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            entries: HashMap::new(),
            stats: IndexStats::default(),
        }
    }

    /// Inserts or replaces the entry for `key` in O(log n).
    pub fn upsert(&mut self, key: &str, coordinates: Coordinates, value: T) {
        if let Some(existing) = self.entries.remove(key) {
            let _ = self.tree.remove(&existing);
        }

        let entry = IndexEntry::new(key.to_string(), coordinates, value);
        self.tree.insert(entry.clone());
        self.entries.insert(key.to_string(), entry);
        self.stats.total_insertions += 1;
    }

    /// Removes the entry for `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<T> {
        let existing = self.entries.remove(key)?;
        let _ = self.tree.remove(&existing);
        self.stats.total_removals += 1;
        Some(existing.value)
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every entry within `radius_meters` of `center` that passes
    /// `filter`, nearest first.
    pub fn within_radius<F>(
        &self,
        center: &Coordinates,
        radius_meters: f64,
        mut filter: F,
    ) -> Vec<IndexHit<T>>
    where
        F: FnMut(&str, &T) -> bool,
    {
        let center_point = center.to_sphere_point();
        let chord = chord_radius(radius_meters);

        let mut results: Vec<IndexHit<T>> = self
            .tree
            .locate_within_distance(center_point, chord * chord)
            .filter_map(|entry| {
                if !filter(&entry.key, &entry.value) {
                    return None;
                }

                let distance = distance_meters(center, &entry.coordinates);
                if distance > radius_meters {
                    return None;
                }

                Some(IndexHit {
                    key: entry.key.clone(),
                    coordinates: entry.coordinates,
                    value: entry.value.clone(),
                    distance,
                })
            })
            .collect();

        results.sort_by(by_distance);
        results
    }

    /// Keeps only entries for which `keep` returns true. Returns the number
    /// of removed entries.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&str, &T) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .values()
            .filter(|entry| !keep(&entry.key, &entry.value))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    /// Bulk-reloads the tree for better balance after heavy churn.
    pub fn rebuild(&mut self) {
        let entries: Vec<_> = self.entries.values().cloned().collect();
        self.tree = RTree::bulk_load(entries);
        self.stats.total_rebuilds += 1;
    }

    pub fn stats(&self) -> IndexStats {
        self.stats.clone()
    }
}

impl<T: Clone> Default for GeoIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
