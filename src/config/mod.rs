//! Client configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SocketOptions`] | Reconnection policy and transport timeouts |
//! | [`BackendConfig`] | Backend address per build profile and platform |

// ============================================================================
// Submodules
// ============================================================================

/// Backend address selection.
pub mod backend;

/// Socket connection options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use backend::{BackendConfig, BuildProfile, Platform};
pub use options::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY, SocketOptions};
