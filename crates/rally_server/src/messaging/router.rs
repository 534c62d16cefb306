//! Dispatches client messages to the proximity engine.

use crate::{
    error::ServerError,
    messaging::types::{
        AddPostRequest, ClientMessage, CreatedPost, ErrorBody, NearbyPlayersRequest,
        PostReachedRequest, ServerMessage, UpdatePositionRequest,
    },
};
use rally_core::{Coordinates, GeoError, Post, ProximityEngine, Task};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Outcome of one routed request before it is wrapped in a reply.
#[derive(Debug)]
enum RouteError {
    Protocol(ServerError),
    Game(GeoError),
}

impl From<GeoError> for RouteError {
    fn from(error: GeoError) -> Self {
        RouteError::Game(error)
    }
}

impl From<ServerError> for RouteError {
    fn from(error: ServerError) -> Self {
        RouteError::Protocol(error)
    }
}

/// Parses a raw text frame, runs the matching engine operation and builds
/// the reply. Always produces a reply, failures included.
///
/// # Routes
///
/// | Route | Operation |
/// |---|---|
/// | `game:nearby_players` | report position, list nearby teams |
/// | `game:update_position` | report position only |
/// | `game:post_reached` | post reachability check |
/// | `admin:add_post` | create a post |
///
/// `admin:*` routes carry no authentication of their own. They are only
/// served when `allow_admin` is set, which should be limited to listeners
/// that only trusted operators can reach.
pub async fn route_client_message(
    text: &str,
    engine: &ProximityEngine,
    allow_admin: bool,
) -> ServerMessage {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("❌ Unparseable client message: {}", e);
            return ServerMessage::protocol_error(None, "unknown", format!("Invalid JSON: {e}"));
        }
    };

    let route = message.route();
    debug!("📨 Routing '{}'", route);

    let result = match route.as_str() {
        "game:nearby_players" => nearby_players(&message, engine).await,
        "game:update_position" => update_position(&message, engine).await,
        "game:post_reached" => post_reached(&message, engine).await,
        "admin:add_post" if allow_admin => add_post(&message, engine).await,
        _ if message.namespace == "admin" => {
            Err(ServerError::Protocol(format!("Route '{route}' is disabled on this server")).into())
        }
        _ => Err(ServerError::Protocol(format!("Unknown route '{route}'")).into()),
    };

    match result {
        Ok(data) => {
            trace!("✅ '{}' handled", route);
            ServerMessage::success(message.id, route, data)
        }
        Err(RouteError::Game(e)) => {
            debug!("⚠️ '{}' failed: {}", route, e);
            ServerMessage::failure(message.id, route, ErrorBody::from(&e))
        }
        Err(RouteError::Protocol(e)) => {
            warn!("❌ Rejected '{}': {}", route, e);
            ServerMessage::protocol_error(message.id, route, e.to_string())
        }
    }
}

fn payload<T: DeserializeOwned>(message: &ClientMessage) -> Result<T, ServerError> {
    serde_json::from_value(message.data.clone())
        .map_err(|e| ServerError::Protocol(format!("Invalid payload for '{}': {e}", message.route())))
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RouteError> {
    serde_json::to_value(value)
        .map_err(|e| RouteError::Protocol(ServerError::Internal(format!("Failed to encode reply: {e}"))))
}

async fn nearby_players(
    message: &ClientMessage,
    engine: &ProximityEngine,
) -> Result<serde_json::Value, RouteError> {
    let request: NearbyPlayersRequest = payload(message)?;
    let coordinates = Coordinates::new(request.lon, request.lat)?;
    let players = engine
        .report_and_find_nearby(&request.user_name, &request.password, coordinates, request.distance)
        .await?;
    to_json(&players)
}

async fn update_position(
    message: &ClientMessage,
    engine: &ProximityEngine,
) -> Result<serde_json::Value, RouteError> {
    let request: UpdatePositionRequest = payload(message)?;
    let coordinates = Coordinates::new(request.lon, request.lat)?;
    let position = engine.report_position_only(&request.user_name, coordinates).await?;
    to_json(&position)
}

async fn post_reached(
    message: &ClientMessage,
    engine: &ProximityEngine,
) -> Result<serde_json::Value, RouteError> {
    let request: PostReachedRequest = payload(message)?;
    let coordinates = Coordinates::new(request.lon, request.lat)?;
    let task = engine.check_post_reachability(&request.post_id, coordinates).await?;
    to_json(&task)
}

async fn add_post(
    message: &ClientMessage,
    engine: &ProximityEngine,
) -> Result<serde_json::Value, RouteError> {
    let request: AddPostRequest = payload(message)?;
    let coordinates = Coordinates::new(request.lon, request.lat)?;
    let post = engine
        .create_post(Post {
            id: request.id,
            coordinates,
            task: Task {
                text: request.task_text,
                is_url: request.is_url,
            },
            solution: request.solution,
        })
        .await?;

    to_json(&CreatedPost {
        post_id: post.id,
        lon: post.coordinates.longitude,
        lat: post.coordinates.latitude,
        task_text: post.task.text,
        is_url: post.task.is_url,
    })
}
