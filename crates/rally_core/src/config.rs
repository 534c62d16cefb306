//! Tunable game rules.

use crate::error::GeoResult;
use crate::eviction::{EvictionPolicy, DEFAULT_FRESHNESS_WINDOW_SECS};
use crate::store::position::DEFAULT_INDEX_SHARDS;
use crate::store::DEFAULT_REACH_RADIUS_METERS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rules shared by the stores, the engine and the eviction sweeper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Positions older than this are treated as absent
    pub freshness_window_secs: u64,
    /// How close a team must be to a post to reach it
    pub reach_radius_meters: f64,
    /// Interval of the background eviction sweep
    pub sweep_interval_ms: u64,
    /// Number of lock shards in each spatial index
    pub index_shards: usize,
}

impl GameRules {
    /// Fails when `freshness_window_secs` is zero or longer than a day.
    pub fn eviction_policy(&self) -> GeoResult<EvictionPolicy> {
        EvictionPolicy::from_secs(self.freshness_window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
            reach_radius_meters: DEFAULT_REACH_RADIUS_METERS,
            sweep_interval_ms: 5000,
            index_shards: DEFAULT_INDEX_SHARDS,
        }
    }
}
