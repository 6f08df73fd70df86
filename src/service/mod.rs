//! Camera socket service.
//!
//! # Components
//!
//! | Module | Description |
//! |--------|-------------|
//! | `machine` | Connection state machine and reconnection policy |
//! | `socket` | [`CameraSocket`] handle and its driver task |
//! | `commands` | Frame request and capture façade |

// ============================================================================
// Submodules
// ============================================================================

/// Frame request and capture façade.
pub mod commands;

/// Service handle and driver task.
mod socket;

/// Connection state machine.
mod machine;

// ============================================================================
// Re-exports
// ============================================================================

pub use commands::CaptureOutcome;
pub use socket::CameraSocket;
pub use machine::{ConnectionState, MANUAL_DISCONNECT_REASON};
