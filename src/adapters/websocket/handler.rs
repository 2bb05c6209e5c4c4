//! WebSocket upgrade handler for real-time dispatch connections.
//!
//! Connection lifecycle:
//! 1. Parse the identity claims from the query string
//! 2. Upgrade to WebSocket and register with the connection registry
//! 3. Drain the connection's outbound queue onto the socket
//! 4. Answer client pings until disconnect
//! 5. Unregister on either side closing

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::domain::foundation::{AgencyId, RoleName, StationId, Timestamp, UserId};

use super::{
    messages::{ClientMessage, ConnectedMessage, ErrorMessage, PongMessage, ServerMessage},
    registry::{ClientIdentity, ConnectionRegistry},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub registry: Arc<ConnectionRegistry>,
}

impl WebSocketState {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

/// Identity claims supplied on connect.
///
/// The surrounding deployment terminates auth upstream (reverse proxy /
/// session middleware) and forwards verified claims here; this layer
/// validates shape only.
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub user_id: String,
    #[serde(default)]
    pub station_id: Option<i64>,
    #[serde(default)]
    pub agency_id: Option<i64>,
    /// Comma-separated role names.
    #[serde(default)]
    pub roles: Option<String>,
}

impl ConnectParams {
    fn into_identity(self) -> Result<ClientIdentity, String> {
        let user_id = UserId::new(self.user_id).map_err(|e| e.to_string())?;
        let mut roles = Vec::new();
        if let Some(raw) = self.roles {
            for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                roles.push(RoleName::new(name).map_err(|e| e.to_string())?);
            }
        }
        Ok(ClientIdentity {
            user_id,
            station: self.station_id.and_then(StationId::from_raw),
            agency: self.agency_id.and_then(AgencyId::from_raw),
            roles,
        })
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws?user_id=...&station_id=...&agency_id=...&roles=a,b`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let identity = match params.into_identity() {
        Ok(identity) => identity,
        Err(reason) => {
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, identity: ClientIdentity, state: WebSocketState) {
    let (mut sink, mut stream) = socket.split();

    let groups = identity.memberships();
    let (handle, mut outbound) = state.registry.register(&identity).await;
    let connection_id = handle.id;

    tracing::info!(
        connection_id = %connection_id,
        user_id = %identity.user_id,
        groups = groups.len(),
        "websocket connected"
    );

    let connected = ServerMessage::Connected(ConnectedMessage {
        connection_id,
        groups: groups.iter().map(|g| g.to_string()).collect(),
        timestamp: Timestamp::now().to_rfc3339(),
    });

    if send_message(&mut sink, &connected).await.is_err() {
        // Client disconnected before the handshake finished.
        state.registry.unregister(&connection_id).await;
        return;
    }

    // Drain the outbound queue onto the wire.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if let Err(e) = send_message(&mut sink, &msg).await {
                tracing::debug!(
                    connection_id = %connection_id,
                    "send error, closing connection: {}",
                    e
                );
                break;
            }
        }
    });

    // Handle incoming frames. Pongs go back through the outbound queue so
    // only the send task writes to the socket.
    let pong_sender = handle.sender.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Ping) => {
                            let _ = pong_sender.try_send(ServerMessage::Pong(PongMessage::now()));
                        }
                        Err(_) => {
                            tracing::debug!(
                                connection_id = %connection_id,
                                "malformed client message"
                            );
                            let _ = pong_sender
                                .try_send(ServerMessage::Error(ErrorMessage::malformed_message()));
                        }
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "received unsupported binary message"
                    );
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level frames, handled by axum.
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    state.registry.unregister(&connection_id).await;
    tracing::info!(connection_id = %connection_id, "websocket disconnected");
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json)).await,
        Err(e) => {
            tracing::error!("server message serialization failed: {}", e);
            Ok(())
        }
    }
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
