//! Event types emitted by the camera socket.
//!
//! | Kind | Payload | Emitted when |
//! |------|---------|--------------|
//! | `Connected` | `bool` | Link enters or leaves the connected state |
//! | `Frame` | [`Frame`] | A camera frame arrives |
//! | `Status` | `serde_json::Value` | The backend reports device status |
//! | `Error` | [`Error`] | Transport failure or reconnection gave up |

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::error::Error;
use crate::protocol::Frame;

// ============================================================================
// EventKind
// ============================================================================

/// Discriminant used to subscribe to one event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection state changed.
    Connected,
    /// Camera frame received.
    Frame,
    /// Device status received.
    Status,
    /// Error reported.
    Error,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 4] = [Self::Connected, Self::Frame, Self::Status, Self::Error];

    /// Returns the wire-level event name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Frame => "frame",
            Self::Status => "status",
            Self::Error => "error",
        }
    }
}

// ============================================================================
// SocketEvent
// ============================================================================

/// An event delivered to subscribers.
///
/// Handlers receive events by reference; payloads are never cloned per
/// subscriber.
#[derive(Debug)]
pub enum SocketEvent {
    /// `true` on entering the connected state, `false` on leaving it.
    Connected(bool),
    /// A decoded camera frame.
    Frame(Frame),
    /// Opaque device status record.
    Status(Value),
    /// Transport error or reconnect ceiling exhaustion.
    Error(Error),
}

impl SocketEvent {
    /// Returns the channel this event is emitted on.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected(_) => EventKind::Connected,
            Self::Frame(_) => EventKind::Frame,
            Self::Status(_) => EventKind::Status,
            Self::Error(_) => EventKind::Error,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
