//! Camera Socket - Live camera feed client.
//!
//! This library connects to a camera backend over WebSocket, receives
//! base64-encoded still frames and device status updates, and sends
//! frame and capture requests back to the device.
//!
//! # Architecture
//!
//! The client follows an actor model:
//!
//! - **Handle**: [`CameraSocket`] forwards calls to a driver task and reads
//!   connection state synchronously
//! - **Driver**: Owns the connection state machine, the live link and the
//!   reconnect timer
//! - **Transport**: Opens links and reports their lifecycle as tagged events
//!
//! Key design principles:
//!
//! - Abnormal closures reconnect after a fixed delay, up to a ceiling
//! - A normal (1000) closure or a manual disconnect never reconnects
//! - Events from superseded links are ignored
//! - A panicking subscriber never affects the others
//!
//! # Quick Start
//!
//! ```no_run
//! use camera_socket::{CameraSocket, Result, SocketOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let socket = CameraSocket::new(SocketOptions::new())?;
//!
//!     socket.on_connected(|connected| println!("connected: {connected}"));
//!     socket.on_frame(|frame| println!("frame at {}", frame.timestamp()));
//!
//!     socket.connect("http://192.168.0.115:3000");
//!     socket.request_frame();
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     socket.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`SocketOptions`] and [`BackendConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`events`] | Event kinds and the subscriber registry |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Inbound and outbound message types |
//! | [`service`] | [`CameraSocket`] and its command façade |
//! | [`transport`] | Endpoint resolution and WebSocket links |
//!
//! # Features
//!
//! - **`tls`**: `wss://` endpoints through `native-tls`

// ============================================================================
// Modules
// ============================================================================

/// Client configuration.
///
/// Reconnection policy, timeouts and backend address selection.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Events and subscriptions.
///
/// - [`SocketEvent`] - Event payloads
/// - [`EventBus`] - Ordered, panic-isolated handler registry
pub mod events;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing subscription and link IDs.
pub mod identifiers;

/// Camera message types.
///
/// Decoding of server messages and encoding of client commands.
pub mod protocol;

/// Camera socket service.
///
/// Use [`CameraSocket::new()`] inside a tokio runtime.
pub mod service;

/// Transport layer.
///
/// Endpoint resolution, the link capability traits and the WebSocket backend.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Service types
pub use service::{CameraSocket, CaptureOutcome, ConnectionState};

// Config types
pub use config::{BackendConfig, BuildProfile, Platform, SocketOptions};

// Error types
pub use error::{Error, Result};

// Event types
pub use events::{EventBus, EventHandler, EventKind, SocketEvent};

// Protocol types
pub use protocol::{Command, Frame, InboundMessage};

// Transport types
pub use transport::{Endpoint, Scheme, Transport, WebSocketTransport};

// Identifier types
pub use identifiers::{LinkId, SubscriptionId};
