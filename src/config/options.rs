//! Socket connection options.
//!
//! Provides a type-safe interface for tuning the reconnection policy and
//! transport timeouts.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use camera_socket::SocketOptions;
//!
//! let options = SocketOptions::new()
//!     .with_reconnect_delay(Duration::from_secs(1))
//!     .with_max_reconnect_attempts(10)
//!     .with_connect_timeout(Duration::from_secs(5));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT_PATH};

// ============================================================================
// Constants
// ============================================================================

/// Delay between an abnormal closure and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Consecutive abnormal closures tolerated before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

// ============================================================================
// SocketOptions
// ============================================================================

/// Camera socket configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOptions {
    /// Delay before each reconnect attempt.
    pub reconnect_delay: Duration,

    /// Reconnect ceiling.
    pub max_reconnect_attempts: u32,

    /// Bound on the WebSocket handshake.
    pub connect_timeout: Duration,

    /// Socket path appended to the backend address.
    pub endpoint_path: String,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SocketOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SocketOptions {
    /// Sets the delay before each reconnect attempt.
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets the reconnect ceiling.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the socket path.
    #[inline]
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SocketOptions {
    /// Checks the options for values the service cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero reconnect ceiling, a zero
    /// handshake timeout, or an empty endpoint path.
    pub fn validate(&self) -> Result<()> {
        if self.max_reconnect_attempts == 0 {
            return Err(Error::config("max_reconnect_attempts must be > 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect_timeout must be > 0"));
        }
        if self.endpoint_path.trim_matches('/').is_empty() {
            return Err(Error::config("endpoint_path must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SocketOptions::new();
        assert_eq!(options.reconnect_delay, Duration::from_secs(2));
        assert_eq!(options.max_reconnect_attempts, 5);
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert_eq!(options.endpoint_path, "/ws");
        assert!(options.validate().is_ok());
        assert_eq!(options, SocketOptions::default());
    }

    #[test]
    fn test_builder_chaining() {
        let options = SocketOptions::new()
            .with_reconnect_delay(Duration::from_millis(500))
            .with_max_reconnect_attempts(3)
            .with_connect_timeout(Duration::from_secs(1))
            .with_endpoint_path("/stream");

        assert_eq!(options.reconnect_delay, Duration::from_millis(500));
        assert_eq!(options.max_reconnect_attempts, 3);
        assert_eq!(options.connect_timeout, Duration::from_secs(1));
        assert_eq!(options.endpoint_path, "/stream");
    }

    #[test]
    fn test_validation_failures() {
        assert!(
            SocketOptions::new()
                .with_max_reconnect_attempts(0)
                .validate()
                .is_err()
        );
        assert!(
            SocketOptions::new()
                .with_connect_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            SocketOptions::new()
                .with_endpoint_path("/")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_zero_reconnect_delay_allowed() {
        let options = SocketOptions::new().with_reconnect_delay(Duration::ZERO);
        assert!(options.validate().is_ok());
    }
}
