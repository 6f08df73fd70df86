//! WebSocket transport layer.
//!
//! This module resolves the backend's socket endpoint and defines the
//! capability interface the connection state machine drives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  CameraSocket   │                              │  Backend        │
//! │                 │         WebSocket            │                 │
//! │  driver task    │◄────────────────────────────►│  /ws            │
//! │  → Link         │      ws(s)://host:port       │  (relays ESP32  │
//! │                 │                              │   MJPEG frames) │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `endpoint` | Backend address → socket endpoint |
//! | `link` | [`Transport`] / [`Link`] traits and link notifications |
//! | `websocket` | `tokio-tungstenite` backend |

// ============================================================================
// Submodules
// ============================================================================

/// Endpoint resolution.
pub mod endpoint;

/// Transport capability interface.
pub mod link;

/// WebSocket backend.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use endpoint::{DEFAULT_ENDPOINT_PATH, Endpoint, Scheme};
pub use link::{
    CloseInfo, Link, LinkEvent, LinkEventKind, LinkEventSender, NORMAL_CLOSURE, Transport,
};
pub use websocket::{DEFAULT_CONNECT_TIMEOUT, WebSocketTransport};
