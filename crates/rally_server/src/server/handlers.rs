//! Connection handling logic for WebSocket clients.

use crate::{
    connection::{ConnectionId, ConnectionManager},
    error::ServerError,
    messaging::{route_client_message, ServerMessage},
};
use futures_util::{SinkExt, StreamExt};
use rally_core::{ProximityEngine, ShutdownState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, trace, warn};

/// Settings a connection handler needs from the server.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_manager: Arc<ConnectionManager>,
    pub engine: Arc<ProximityEngine>,
    pub max_message_size: usize,
    pub enable_admin_routes: bool,
    pub shutdown: ShutdownState,
}

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Register with the connection manager (refused when the server is full)
/// 2. Perform the WebSocket handshake
/// 3. Answer each text frame with exactly one reply, in order
/// 4. Stop on close, socket error or server shutdown
/// 5. Unregister the connection
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    context: ConnectionContext,
) -> Result<(), ServerError> {
    let connection_id = context.connection_manager.add_connection(addr).await?;

    let result = serve_connection(stream, connection_id, &context).await;
    context.connection_manager.remove_connection(connection_id).await;
    result
}

async fn serve_connection(
    stream: TcpStream,
    connection_id: ConnectionId,
    context: &ConnectionContext,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed: {e}")))?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        let msg = tokio::select! {
            _ = context.shutdown.wait() => {
                debug!("🛑 Closing connection {} for shutdown", connection_id);
                let close = Message::Close(Some(CloseFrame {
                    code: CloseCode::Away,
                    reason: "server shutting down".to_string().into(),
                }));
                let _ = ws_sender.send(close).await;
                break;
            }
            msg = ws_receiver.next() => msg,
        };

        let Some(msg) = msg else {
            break;
        };

        match msg {
            Ok(Message::Text(text)) => {
                let reply = if text.len() > context.max_message_size {
                    warn!(
                        "🚫 Connection {} sent {} bytes (limit {})",
                        connection_id,
                        text.len(),
                        context.max_message_size
                    );
                    ServerMessage::protocol_error(
                        None,
                        "unknown",
                        format!("message exceeds {} bytes", context.max_message_size),
                    )
                } else {
                    route_client_message(&text, &context.engine, context.enable_admin_routes).await
                };

                let payload = serde_json::to_string(&reply)
                    .map_err(|e| ServerError::Internal(format!("Failed to encode reply: {e}")))?;
                ws_sender
                    .send(Message::Text(payload.into()))
                    .await
                    .map_err(|e| ServerError::Network(format!("Failed to send reply: {e}")))?;
                context.connection_manager.record_request(connection_id).await;
            }
            Ok(Message::Binary(_)) => {
                trace!("Ignoring binary frame on connection {}", connection_id);
            }
            Ok(Message::Ping(data)) => {
                let _ = ws_sender.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                debug!("🔌 Client {} requested close", connection_id);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("WebSocket error for connection {}: {}", connection_id, e);
                break;
            }
        }
    }

    Ok(())
}
