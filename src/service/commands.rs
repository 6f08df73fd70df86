//! Camera command façade.
//!
//! Convenience wrappers over [`CameraSocket::send`] for the commands the
//! camera understands.
//!
//! | Method | Wire message |
//! |--------|--------------|
//! | [`request_frame`](CameraSocket::request_frame) | `{"type":"requestFrame"}` |
//! | [`capture`](CameraSocket::capture) | `{"type":"capture"}` |

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::Command;

use super::CameraSocket;

// ============================================================================
// Constants
// ============================================================================

/// Message reported when a capture request was handed to the link.
pub const CAPTURE_SENT_MESSAGE: &str = "Capture request sent";

/// Message reported when a capture is requested without a connection.
pub const NOT_CONNECTED_MESSAGE: &str = "WebSocket not connected";

// ============================================================================
// CaptureOutcome
// ============================================================================

/// Immediate result of a capture request.
///
/// The capture itself completes on the device; a successful outcome only
/// means the request was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Request sent; the result arrives later, if at all.
    Pending {
        /// Human-readable note.
        message: String,
    },
    /// Request not sent.
    Failed {
        /// Reason.
        error: String,
    },
}

impl CaptureOutcome {
    /// Returns `true` if the request was sent.
    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

// ============================================================================
// CameraSocket - Commands
// ============================================================================

impl CameraSocket {
    /// Asks the camera for a frame. Dropped when not connected.
    pub fn request_frame(&self) {
        self.send(Command::RequestFrame);
    }

    /// Asks the camera to capture a still.
    ///
    /// `callback` runs exactly once, before this method returns.
    pub fn capture<F>(&self, callback: F)
    where
        F: FnOnce(CaptureOutcome),
    {
        if !self.is_connected() {
            callback(CaptureOutcome::Failed {
                error: NOT_CONNECTED_MESSAGE.to_string(),
            });
            return;
        }

        self.send(Command::Capture);
        callback(CaptureOutcome::Pending {
            message: CAPTURE_SENT_MESSAGE.to_string(),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::config::SocketOptions;
    use crate::error::Result;
    use crate::transport::{CloseInfo, Endpoint, Link, LinkEventSender, Transport};

    /// Transport whose links open immediately and record sent frames.
    #[derive(Clone, Default)]
    struct InstantTransport {
        sent: Arc<Mutex<Vec<String>>>,
    }

    struct InstantLink {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for InstantTransport {
        fn open(&self, _endpoint: &Endpoint, events: LinkEventSender) -> Result<Box<dyn Link>> {
            events.opened();
            Ok(Box::new(InstantLink {
                sent: Arc::clone(&self.sent),
            }))
        }
    }

    impl Link for InstantLink {
        fn send(&self, text: String) -> Result<()> {
            self.sent.lock().push(text);
            Ok(())
        }

        fn close(&self, _close: CloseInfo) {}
    }

    async fn settle() {
        for _ in 0..64 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_capture_without_connection_fails_synchronously() {
        let transport = InstantTransport::default();
        let socket =
            CameraSocket::with_transport(SocketOptions::new(), transport.clone()).expect("socket");

        let mut outcome = None;
        socket.capture(|o| outcome = Some(o));

        assert_eq!(
            outcome,
            Some(CaptureOutcome::Failed {
                error: "WebSocket not connected".into()
            })
        );
        settle().await;
        assert!(transport.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_capture_and_request_frame_when_connected() {
        let transport = InstantTransport::default();
        let socket =
            CameraSocket::with_transport(SocketOptions::new(), transport.clone()).expect("socket");
        socket.connect("camera.local:3000");
        settle().await;
        assert!(socket.is_connected());

        let mut outcome = None;
        socket.capture(|o| outcome = Some(o));
        let outcome = outcome.expect("callback invoked");
        assert!(outcome.is_success());
        assert_eq!(
            outcome,
            CaptureOutcome::Pending {
                message: "Capture request sent".into()
            }
        );

        socket.request_frame();
        settle().await;
        assert_eq!(
            *transport.sent.lock(),
            vec![
                r#"{"type":"capture"}"#.to_string(),
                r#"{"type":"requestFrame"}"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_frame_without_connection_is_dropped() {
        let transport = InstantTransport::default();
        let socket =
            CameraSocket::with_transport(SocketOptions::new(), transport.clone()).expect("socket");

        socket.request_frame();
        settle().await;
        assert!(transport.sent.lock().is_empty());
    }
}
