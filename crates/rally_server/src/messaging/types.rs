//! Wire format of requests and replies.
//!
//! Every request is a [`ClientMessage`] naming a `namespace` and an `event`;
//! its `data` is decoded into one of the request payloads below. Payload field
//! names follow the game's public HTTP API (`userName`, `lon`, `lat`, ...), so
//! existing clients can reuse their bodies unchanged.

use rally_core::GeoError;
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
///
/// ```json
/// {
///   "id": "42",
///   "namespace": "game",
///   "event": "nearby_players",
///   "data": { "userName": "team1", "password": "secret", "lon": 12.48, "lat": 55.77, "distance": 100 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Echoed back in the reply so clients can match responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub namespace: String,

    pub event: String,

    /// The message payload as a JSON value
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ClientMessage {
    /// `namespace:event`, the routing key.
    pub fn route(&self) -> String {
        format!("{}:{}", self.namespace, self.event)
    }
}

/// `game:nearby_players`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPlayersRequest {
    pub user_name: String,
    pub password: String,
    pub lon: f64,
    pub lat: f64,
    /// Search radius in meters
    pub distance: f64,
}

/// `game:update_position`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePositionRequest {
    pub user_name: String,
    pub lon: f64,
    pub lat: f64,
}

/// `game:post_reached`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReachedRequest {
    pub post_id: String,
    pub lon: f64,
    pub lat: f64,
}

/// `admin:add_post`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPostRequest {
    pub id: String,
    pub lon: f64,
    pub lat: f64,
    pub task_text: String,
    #[serde(default)]
    pub is_url: bool,
    pub solution: String,
}

/// Reply payload for a created post. The solution is not echoed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPost {
    pub post_id: String,
    pub lon: f64,
    pub lat: f64,
    pub task_text: String,
    pub is_url: bool,
}

/// Error body of a failed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable tag such as `not_reached` or `unauthorized`
    pub kind: String,
    /// HTTP-style status code
    pub code: u16,
    pub message: String,
}

impl From<&GeoError> for ErrorBody {
    fn from(error: &GeoError) -> Self {
        Self {
            kind: error.kind().to_string(),
            code: error.status_code(),
            message: error.to_string(),
        }
    }
}

/// A reply sent from the server to a client, one per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Route of the request being answered
    pub event: String,

    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ServerMessage {
    pub fn success(id: Option<String>, event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id,
            event: event.into(),
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(id: Option<String>, event: impl Into<String>, error: ErrorBody) -> Self {
        Self {
            id,
            event: event.into(),
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    /// Reply for a request that could not be understood.
    pub fn protocol_error(
        id: Option<String>,
        event: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::failure(
            id,
            event,
            ErrorBody {
                kind: "protocol".to_string(),
                code: 400,
                message: message.into(),
            },
        )
    }
}
