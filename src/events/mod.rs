//! Typed event subscription.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Publish/subscribe registry |
//! | `event` | [`SocketEvent`] and [`EventKind`] |

// ============================================================================
// Submodules
// ============================================================================

/// Publish/subscribe registry.
pub mod bus;

/// Event payload types.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{EventBus, EventHandler};
pub use event::{EventKind, SocketEvent};
