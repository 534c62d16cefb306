//! Records held by the stores and the public views built from them.
//!
//! Stored coordinates are (longitude, latitude). The nearby-player view lists
//! latitude before longitude; clients depend on that ordering, so it is kept.

use crate::geo::Coordinates;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The most recent reported location of one identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Natural key, one live record per identity
    pub identity: String,
    /// Denormalized from the identity's user record at write time
    pub display_name: Option<String>,
    pub coordinates: Coordinates,
    pub last_updated: DateTime<Utc>,
}

/// Input to a position upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub identity: String,
    /// `None` keeps whatever display name is already on record
    pub display_name: Option<String>,
    pub coordinates: Coordinates,
}

/// Challenge payload attached to a post
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub text: String,
    /// Whether `text` is a URL the client should open
    pub is_url: bool,
}

/// A static point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub coordinates: Coordinates,
    pub task: Task,
    /// Never returned by reachability checks
    pub solution: String,
}

/// A resolved user as returned by the identity collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub identity: String,
    pub display_name: String,
}

/// A neighbor returned by the nearby-players flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPlayer {
    pub identity: String,
    pub display_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Position> for NearbyPlayer {
    fn from(position: Position) -> Self {
        Self {
            identity: position.identity,
            display_name: position.display_name,
            latitude: position.coordinates.latitude,
            longitude: position.coordinates.longitude,
        }
    }
}

/// Result of the unauthenticated position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub identity: String,
    pub display_name: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<Position> for PositionView {
    fn from(position: Position) -> Self {
        Self {
            identity: position.identity,
            display_name: position.display_name,
            last_updated: position.last_updated,
            longitude: position.coordinates.longitude,
            latitude: position.coordinates.latitude,
        }
    }
}

/// What a player sees on reaching a post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTask {
    pub post_id: String,
    pub task_text: String,
    pub is_url: bool,
}

impl From<Post> for PostTask {
    fn from(post: Post) -> Self {
        Self {
            post_id: post.id,
            task_text: post.task.text,
            is_url: post.task.is_url,
        }
    }
}
