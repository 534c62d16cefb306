//! # Proximity Engine
//!
//! Orchestrates the game's public operations on top of the stores:
//!
//! - **Report and find nearby**: authenticate, store the caller's position,
//!   then list the other fresh teams within a radius.
//! - **Report position only**: unauthenticated upsert, no neighbor search.
//! - **Post reachability**: reveal a post's task when the caller stands
//!   within the reach radius.
//! - **Create post**: administrative insert.
//!
//! Each call is a complete transaction of its own. No lock is held across
//! store calls and store errors are returned to the caller unchanged.

use crate::clock::Clock;
use crate::config::GameRules;
use crate::error::{GeoError, GeoResult};
use crate::geo::{validate_radius, Coordinates};
use crate::identity::IdentityResolver;
use crate::store::{PositionStore, PostStore};
use crate::types::{NearbyPlayer, PositionUpdate, PositionView, Post, PostTask};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entry point for every game operation.
#[derive(Debug, Clone)]
pub struct ProximityEngine {
    positions: Arc<dyn PositionStore>,
    posts: Arc<dyn PostStore>,
    identities: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    rules: GameRules,
}

impl ProximityEngine {
    pub fn new(
        positions: Arc<dyn PositionStore>,
        posts: Arc<dyn PostStore>,
        identities: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        rules: GameRules,
    ) -> Self {
        Self {
            positions,
            posts,
            identities,
            clock,
            rules,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn positions(&self) -> &Arc<dyn PositionStore> {
        &self.positions
    }

    pub fn posts(&self) -> &Arc<dyn PostStore> {
        &self.posts
    }

    /// Authenticates the caller, records their position and returns the
    /// other fresh teams within `radius_meters`, nearest first.
    ///
    /// An unknown identity and a wrong credential both fail with the same
    /// [`GeoError::Unauthorized`].
    pub async fn report_and_find_nearby(
        &self,
        identity: &str,
        credential: &str,
        coordinates: Coordinates,
        radius_meters: f64,
    ) -> GeoResult<Vec<NearbyPlayer>> {
        coordinates.validate()?;
        validate_radius(radius_meters)?;

        let user = match self.identities.resolve(identity).await {
            Ok(user) => user,
            Err(GeoError::NotFound { .. }) => {
                warn!("🔐 Rejected position report: unknown identity");
                return Err(GeoError::Unauthorized);
            }
            Err(e) => return Err(e),
        };
        if !self.identities.verify(identity, credential).await {
            warn!("🔐 Rejected position report: bad credential for '{}'", identity);
            return Err(GeoError::Unauthorized);
        }

        let now = self.clock.now();
        self.positions
            .upsert(
                PositionUpdate {
                    identity: user.identity.clone(),
                    display_name: Some(user.display_name),
                    coordinates,
                },
                now,
            )
            .await?;

        let neighbors = self
            .positions
            .find_within_radius(&coordinates, radius_meters, &user.identity, now)
            .await?;

        debug!(
            "📡 '{}' sees {} team(s) within {}m",
            user.identity,
            neighbors.len(),
            radius_meters
        );
        Ok(neighbors.into_iter().map(NearbyPlayer::from).collect())
    }

    /// Records a position without any credential check.
    pub async fn report_position_only(
        &self,
        identity: &str,
        coordinates: Coordinates,
    ) -> GeoResult<PositionView> {
        let stored = self
            .positions
            .upsert(
                PositionUpdate {
                    identity: identity.to_string(),
                    display_name: None,
                    coordinates,
                },
                self.clock.now(),
            )
            .await?;
        Ok(PositionView::from(stored))
    }

    /// Returns the post's task when `coordinates` is within the reach radius.
    pub async fn check_post_reachability(
        &self,
        post_id: &str,
        coordinates: Coordinates,
    ) -> GeoResult<PostTask> {
        let post = self
            .posts
            .find_reachable(post_id, &coordinates, self.rules.reach_radius_meters)
            .await?;
        info!("🚩 Post '{}' reached", post.id);
        Ok(PostTask::from(post))
    }

    pub async fn create_post(&self, post: Post) -> GeoResult<Post> {
        self.posts.create(post).await
    }
}
