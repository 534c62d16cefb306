//! Error taxonomy for the proximity engine.
//!
//! Every store and engine operation fails with a [`GeoError`]. Store errors
//! propagate unchanged through the engine to the caller; nothing in the core
//! retries or swallows them.

/// Errors produced by the geospatial stores and the proximity engine.
///
/// `NotFound` and `NotReached` are separate variants so callers can tell
/// "the post does not exist" apart from "the post exists but you are too far
/// away", even when both are shown to players with a similar message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Malformed coordinates or radius
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown identity or wrong credential. The two causes are merged.
    #[error("wrong username or password")]
    Unauthorized,

    /// The referenced entity does not exist
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity that was looked up ("post", "identity", ...)
        entity: &'static str,
        /// Key used for the lookup
        id: String,
    },

    /// The post exists but the caller is outside the reach radius
    #[error("Post not reached")]
    NotReached {
        /// Post the caller tried to reach
        post_id: String,
        /// Distance between the caller and the post, in meters
        distance_meters: f64,
    },

    /// A record with the same key already exists
    #[error("{entity} '{id}' already exists")]
    AlreadyExists {
        /// Kind of entity being created
        entity: &'static str,
        /// Duplicate key
        id: String,
    },

    /// The backing storage is closed or unreachable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl GeoError {
    /// Shorthand for a missing post.
    pub fn post_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "post",
            id: id.into(),
        }
    }

    /// Stable machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            GeoError::InvalidArgument(_) => "invalid_argument",
            GeoError::Unauthorized => "unauthorized",
            GeoError::NotFound { .. } => "not_found",
            GeoError::NotReached { .. } => "not_reached",
            GeoError::AlreadyExists { .. } => "already_exists",
            GeoError::Unavailable(_) => "unavailable",
        }
    }

    /// HTTP-style status code matching the public game API.
    pub fn status_code(&self) -> u16 {
        match self {
            GeoError::InvalidArgument(_) | GeoError::NotReached { .. } => 400,
            GeoError::Unauthorized => 403,
            GeoError::NotFound { .. } => 404,
            GeoError::AlreadyExists { .. } => 409,
            GeoError::Unavailable(_) => 503,
        }
    }
}

/// Result alias used across the crate.
pub type GeoResult<T> = Result<T, GeoError>;
