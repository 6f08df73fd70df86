//! WebSocket transport backend.
//!
//! Each link spawns a tokio task that performs the client handshake and
//! then runs the I/O loop:
//!
//! - Incoming text frames are forwarded as `Message` notifications
//! - Outgoing frames and close requests arrive over an unbounded channel
//! - Binary, ping and pong frames are ignored
//!
//! The handshake is bounded by the configured connect timeout. A handshake
//! failure is reported as `Error` followed by `Closed(None)`, which the
//! state machine treats as an abnormal closure.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};

use super::{CloseInfo, Endpoint, Link, LinkEventSender, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Default bound on the WebSocket handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the link task.
enum LinkCommand {
    /// Send a text frame.
    Send(String),
    /// Send a close frame and stop.
    Close(CloseInfo),
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// `tokio-tungstenite` backed transport.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl WebSocketTransport {
    /// Creates a transport with the given handshake timeout.
    #[inline]
    #[must_use]
    pub const fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Returns the handshake timeout.
    #[inline]
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, endpoint: &Endpoint, events: LinkEventSender) -> Result<Box<dyn Link>> {
        let url = endpoint.as_url();
        let request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::construction(&url, e.to_string()))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();

        debug!(link = %events.link(), %url, "Opening WebSocket link");
        tokio::spawn(run_link(request, command_rx, events, self.connect_timeout));

        Ok(Box::new(WebSocketLink { command_tx }))
    }
}

// ============================================================================
// WebSocketLink
// ============================================================================

/// Handle to a running link task.
struct WebSocketLink {
    command_tx: mpsc::UnboundedSender<LinkCommand>,
}

impl Link for WebSocketLink {
    fn send(&self, text: String) -> Result<()> {
        self.command_tx
            .send(LinkCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn close(&self, close: CloseInfo) {
        let _ = self.command_tx.send(LinkCommand::Close(close));
    }
}

// ============================================================================
// Link Task
// ============================================================================

/// Handshake plus I/O loop for one link.
async fn run_link(
    request: Request,
    mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    events: LinkEventSender,
    connect_timeout: Duration,
) {
    let link = events.link();

    // Any command before the handshake completes can only be a close.
    let handshake = tokio::select! {
        result = timeout(connect_timeout, connect_async(request)) => result,
        _ = command_rx.recv() => {
            debug!(%link, "Link closed before handshake completed");
            return;
        }
    };

    let ws_stream = match handshake {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            warn!(%link, error = %e, "WebSocket handshake failed");
            events.error(e.to_string());
            events.closed(None);
            return;
        }
        Err(_) => {
            warn!(%link, timeout_ms = connect_timeout.as_millis() as u64, "WebSocket handshake timed out");
            events.error(format!(
                "Connection timeout after {}ms",
                connect_timeout.as_millis()
            ));
            events.closed(None);
            return;
        }
    };

    events.opened();
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        trace!(%link, len = text.as_str().len(), "Text frame received");
                        events.message(text.as_str());
                    }

                    Some(Ok(Message::Close(frame))) => {
                        let close = frame.map(|f| CloseInfo::new(u16::from(f.code), f.reason.as_str()));
                        debug!(%link, ?close, "WebSocket closed by remote");
                        events.closed(close);
                        break;
                    }

                    Some(Err(e)) => {
                        error!(%link, error = %e, "WebSocket error");
                        events.error(e.to_string());
                        events.closed(None);
                        break;
                    }

                    None => {
                        debug!(%link, "WebSocket stream ended");
                        events.closed(None);
                        break;
                    }

                    // Ignore Binary, Ping, Pong
                    _ => {}
                }
            }

            command = command_rx.recv() => {
                match command {
                    Some(LinkCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            warn!(%link, error = %e, "Failed to send frame");
                        }
                    }

                    Some(LinkCommand::Close(close)) => {
                        let frame = CloseFrame {
                            code: CloseCode::from(close.code),
                            reason: close.reason.clone().into(),
                        };
                        if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                            debug!(%link, error = %e, "Close frame not delivered");
                        }
                        events.closed(Some(close));
                        break;
                    }

                    None => {
                        debug!(%link, "Link handle dropped");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    debug!(%link, "Link task terminated");
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::LinkId;
    use crate::transport::LinkEventKind;

    #[test]
    fn test_default_timeout() {
        assert_eq!(WebSocketTransport::default().connect_timeout().as_secs(), 10);
    }

    #[tokio::test]
    async fn test_unusable_endpoint_fails_construction() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let events = LinkEventSender::new(LinkId::new(1), tx);
        let endpoint = Endpoint::resolve("http://bad host:3000");

        let err = WebSocketTransport::default()
            .open(&endpoint, events)
            .err()
            .expect("construction should fail");
        assert!(matches!(err, Error::Construction { .. }));
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_close() {
        // Bind and drop to obtain a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = LinkEventSender::new(LinkId::new(1), tx);
        let endpoint = Endpoint::resolve(&format!("http://127.0.0.1:{port}"));

        let _link = WebSocketTransport::default()
            .open(&endpoint, events)
            .expect("construction");

        let first = rx.recv().await.expect("event");
        assert!(matches!(first.kind, LinkEventKind::Error(_)));
        let second = rx.recv().await.expect("event");
        assert_eq!(second.kind, LinkEventKind::Closed(None));
    }
}
