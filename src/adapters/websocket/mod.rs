//! WebSocket adapters for real-time dispatch notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      DispatchService                                 │
//! │   durable write → event → fan-out → inbox recording                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ publish (best effort)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     FanoutPublisher                                  │
//! │   - Resolves each target group to its live members                  │
//! │   - try_send into each member's bounded queue                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   ConnectionRegistry                                 │
//! │   Group: station:7     Group: agency:3      Group: global           │
//! │   ├── conn-a           ├── conn-a           └── conn-d              │
//! │   └── conn-b           └── conn-c                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`registry`] - Group-indexed connection registry
//! - [`publisher`] - Best-effort fan-out over the registry
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod messages;
pub mod publisher;
pub mod registry;

pub use handler::{websocket_router, ws_handler, ConnectParams, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, ErrorMessage, EventMessage, PongMessage, ServerMessage,
};
pub use publisher::FanoutPublisher;
pub use registry::{ClientIdentity, ConnectionHandle, ConnectionRegistry};
