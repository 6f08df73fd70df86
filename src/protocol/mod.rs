//! WebSocket protocol message types.
//!
//! All messages are JSON text frames carrying a `type` discriminator.
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `frame` | Server → Client | Base64 camera frame with timestamp |
//! | `status` | Server → Client | Opaque device status |
//! | `requestFrame` | Client → Server | Ask for the latest frame |
//! | `capture` | Client → Server | Ask for a still capture |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `inbound` | [`InboundMessage`] decoding and [`Frame`] |
//! | `outbound` | [`Command`] encoding |

// ============================================================================
// Submodules
// ============================================================================

/// Server → client messages.
pub mod inbound;

/// Client → server commands.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::{Frame, InboundMessage, now_ms};
pub use outbound::Command;
