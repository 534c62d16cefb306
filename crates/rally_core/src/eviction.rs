//! Freshness window and background eviction of stale positions.
//!
//! Staleness is enforced twice: the position store filters stale records out
//! of every read using [`EvictionPolicy::is_fresh`], and an
//! [`EvictionSweeper`] task physically removes them on an interval. Reads are
//! therefore correct even between sweeps.

use crate::clock::Clock;
use crate::error::{GeoError, GeoResult};
use crate::shutdown::ShutdownState;
use crate::store::PositionStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Seconds after which an unrefreshed position is treated as absent.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 30;

/// Longest accepted freshness window (one day).
pub const MAX_FRESHNESS_WINDOW_SECS: u64 = 86_400;

/// Time-to-live rule for position records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionPolicy {
    ttl: Duration,
}

impl EvictionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Builds a policy from a whole number of seconds.
    ///
    /// The window must lie in `1..=MAX_FRESHNESS_WINDOW_SECS`.
    pub fn from_secs(secs: u64) -> GeoResult<Self> {
        if secs == 0 || secs > MAX_FRESHNESS_WINDOW_SECS {
            return Err(GeoError::InvalidArgument(format!(
                "freshness window must be between 1 and {MAX_FRESHNESS_WINDOW_SECS} seconds, got {secs}"
            )));
        }
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .map(Self::new)
            .ok_or_else(|| {
                GeoError::InvalidArgument(format!("freshness window out of range: {secs}s"))
            })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A record is fresh while `now - last_updated < ttl`.
    pub fn is_fresh(&self, last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_updated) < self.ttl
    }

    pub fn is_stale(&self, last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        !self.is_fresh(last_updated, now)
    }
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_FRESHNESS_WINDOW_SECS as i64))
    }
}

/// Periodically removes stale positions from a store.
#[derive(Debug, Clone)]
pub struct EvictionSweeper {
    store: Arc<dyn PositionStore>,
    clock: Arc<dyn Clock>,
    interval: std::time::Duration,
}

impl EvictionSweeper {
    pub fn new(
        store: Arc<dyn PositionStore>,
        clock: Arc<dyn Clock>,
        interval: std::time::Duration,
    ) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Runs one sweep and returns the number of removed records.
    pub async fn sweep_once(&self) -> crate::GeoResult<usize> {
        let removed = self.store.evict_stale(self.clock.now()).await?;
        if removed > 0 {
            info!("🧹 Evicted {} stale position(s)", removed);
        } else {
            debug!("🧹 Eviction sweep found nothing stale");
        }
        Ok(removed)
    }

    /// Spawns the sweep loop. It stops when `shutdown` is initiated.
    pub fn spawn(self, shutdown: ShutdownState) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // First tick fires immediately
            ticker.tick().await;

            info!("🧹 Eviction sweeper running every {:?}", self.interval);
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            error!("❌ Eviction sweep failed: {}", e);
                        }
                    }
                }
            }
            info!("🧹 Eviction sweeper stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_boundary() {
        let policy = EvictionPolicy::default();
        let now = Utc::now();

        assert!(policy.is_fresh(now, now));
        assert!(policy.is_fresh(now - Duration::seconds(29), now));
        assert!(policy.is_stale(now - Duration::seconds(30), now));
        assert!(policy.is_stale(now - Duration::seconds(31), now));
    }

    #[test]
    fn test_future_timestamps_are_fresh() {
        let policy = EvictionPolicy::from_secs(5).unwrap();
        let now = Utc::now();
        assert!(policy.is_fresh(now + Duration::seconds(10), now));
    }

    #[test]
    fn test_window_bounds() {
        assert_eq!(
            EvictionPolicy::from_secs(1).unwrap().ttl(),
            Duration::seconds(1)
        );
        assert_eq!(
            EvictionPolicy::from_secs(MAX_FRESHNESS_WINDOW_SECS).unwrap().ttl(),
            Duration::seconds(86_400)
        );

        for secs in [0, MAX_FRESHNESS_WINDOW_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            let err = EvictionPolicy::from_secs(secs).unwrap_err();
            assert!(matches!(err, GeoError::InvalidArgument(_)), "{secs}: {err:?}");
        }
    }

    #[tokio::test]
    async fn test_sweep_removes_only_stale_records() {
        use crate::clock::ManualClock;
        use crate::geo::Coordinates;
        use crate::store::MemoryPositionStore;
        use crate::types::PositionUpdate;

        let start = Utc::now();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(MemoryPositionStore::default());
        let here = Coordinates::new(12.48, 55.77).unwrap();

        for identity in ["old", "new"] {
            if identity == "new" {
                clock.advance(Duration::seconds(20));
            }
            store
                .upsert(
                    PositionUpdate {
                        identity: identity.to_string(),
                        display_name: None,
                        coordinates: here,
                    },
                    clock.now(),
                )
                .await
                .unwrap();
        }

        let sweeper = EvictionSweeper::new(
            store.clone(),
            clock.clone(),
            std::time::Duration::from_millis(10),
        );
        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);

        clock.advance(Duration::seconds(15));
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert!(store.get("new", clock.now()).await.unwrap().is_some());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = Arc::new(crate::store::MemoryPositionStore::default());
        let clock = Arc::new(crate::clock::SystemClock);
        let shutdown = ShutdownState::new();

        let handle = EvictionSweeper::new(store, clock, std::time::Duration::from_millis(5))
            .spawn(shutdown.clone());
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        shutdown.initiate_shutdown();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop")
            .unwrap();
    }
}
