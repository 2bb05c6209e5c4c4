//! WebSocket wire protocol.
//!
//! Server → Client: connection acknowledgement, event pushes, errors, pongs.
//! Client → Server: pings. All state-changing traffic goes through the HTTP
//! API; the socket is a one-way notification channel.

use serde::{Deserialize, Serialize};

use crate::domain::dispatch::DispatchEvent;
use crate::domain::foundation::{ConnectionId, EventId, Timestamp};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established and subscribed to its groups.
    Connected(ConnectedMessage),

    /// A domain event push.
    Event(EventMessage),

    /// Error occurred.
    Error(ErrorMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

/// Sent once after the connection is registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: ConnectionId,
    /// Display form of the groups this connection is subscribed to.
    pub groups: Vec<String>,
    pub timestamp: String,
}

/// A pushed domain event.
///
/// A client subscribed through several matching groups may receive the
/// same event more than once; `eventId` is the deduplication key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub event_id: EventId,
    pub event: String,
    pub data: serde_json::Value,
    pub timestamp: String,
}

impl EventMessage {
    /// Builds the wire form of a domain event.
    pub fn from_event(event: &DispatchEvent) -> Self {
        Self {
            event_id: event.event_id,
            event: event.kind.as_str().to_string(),
            data: event.payload.clone(),
            timestamp: event.occurred_at.to_rfc3339(),
        }
    }
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorMessage {
    /// Error for a client frame that did not parse as a known message.
    pub fn malformed_message() -> Self {
        Self {
            code: "MALFORMED_MESSAGE".to_string(),
            message: "Client message was not recognized".to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dispatch::EventKind;
    use crate::domain::routing::EventScope;
    use serde_json::json;

    #[test]
    fn server_message_serializes_with_type_tag() {
        let msg = ServerMessage::Connected(ConnectedMessage {
            connection_id: ConnectionId::new(),
            groups: vec!["station:7".to_string()],
            timestamp: "2025-01-10T00:00:00+00:00".to_string(),
        });

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"connected""#));
        assert!(json.contains(r#""connectionId""#));
        assert!(json.contains(r#""station:7""#));
    }

    #[test]
    fn event_message_carries_kind_and_payload() {
        let event = DispatchEvent::new(
            EventKind::GlobalBroadcast,
            &EventScope::global(),
            json!({"title": "drill"}),
        );
        let msg = ServerMessage::Event(EventMessage::from_event(&event));

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"event""#));
        assert!(json.contains(r#""event":"broadcast.global""#));
        assert!(json.contains(r#""title":"drill""#));
        assert!(json.contains(&event.event_id.to_string()));
    }

    #[test]
    fn malformed_message_error_serializes_with_type_tag() {
        let msg = ServerMessage::Error(ErrorMessage::malformed_message());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""code":"MALFORMED_MESSAGE""#));
    }

    #[test]
    fn client_message_deserializes_ping() {
        let json = r#"{"type": "ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        let json = r#"{"type": "subscribe", "group": "global"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }
}
