//! Error types for the camera socket client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Only service construction and a handful of helpers return [`Result<T>`].
//! Connection-time failures are never returned to callers; they are emitted
//! on the `error` event channel instead:
//!
//! ```ignore
//! use camera_socket::{CameraSocket, SocketOptions};
//!
//! let socket = CameraSocket::new(SocketOptions::new())?;
//! socket.on_error(|err| eprintln!("camera feed: {err}"));
//! socket.connect("http://192.168.0.115:3000");
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Transport`], [`Error::Construction`], [`Error::ConnectionClosed`], [`Error::ReconnectExhausted`] |
//! | Protocol | [`Error::MalformedMessage`] |
//! | External | [`Error::Json`], [`Error::Base64`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use base64::DecodeError;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when socket options are invalid or no runtime is available.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport-level failure on a live or opening link.
    ///
    /// Refused connections, handshake timeouts and dropped streams end up here.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The transport could not be created for an endpoint.
    #[error("Failed to open transport to {endpoint}: {message}")]
    Construction {
        /// Endpoint the transport was created for.
        endpoint: String,
        /// Why construction failed.
        message: String,
    },

    /// Link closed; no further frames can be sent on it.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Automatic reconnection gave up.
    ///
    /// Only a fresh manual `connect()` resumes attempts.
    #[error("Max reconnection attempts reached ({attempts})")]
    ReconnectExhausted {
        /// Attempts made before giving up.
        attempts: u32,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound payload is not a valid application message.
    #[error("Malformed message: {message}")]
    MalformedMessage {
        /// What was wrong with the payload.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame image payload is not valid base64.
    #[error("Invalid image payload: {0}")]
    Base64(#[from] DecodeError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a transport construction error.
    #[inline]
    pub fn construction(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a reconnect-ceiling error.
    #[inline]
    pub fn reconnect_exhausted(attempts: u32) -> Self {
        Self::ReconnectExhausted { attempts }
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Construction { .. }
                | Self::ConnectionClosed
                | Self::ReconnectExhausted { .. }
        )
    }

    /// Returns `true` if this is a protocol (message shape) error.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::MalformedMessage { .. } | Self::Json(_))
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are retried by the reconnection policy.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. }
                | Self::Construction { .. }
                | Self::ConnectionClosed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
