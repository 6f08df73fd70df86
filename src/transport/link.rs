//! Transport capability interface.
//!
//! A [`Transport`] opens [`Link`]s. A link reports its lifecycle through a
//! [`LinkEventSender`] instead of callbacks, so every notification funnels
//! into the service's single driver task:
//!
//! ```text
//! Transport::open ──► Link (send / close)
//!        │
//!        └── LinkEventSender ──► Opened | Message | Error | Closed ──► driver
//! ```
//!
//! Reconnection is not a transport concern; backends only report what
//! happened and the state machine decides what to do about it.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::Result;
use crate::identifiers::LinkId;

use super::Endpoint;

// ============================================================================
// Constants
// ============================================================================

/// Close code for caller-initiated disconnects; suppresses reconnection.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// CloseInfo
// ============================================================================

/// Close code and reason of a terminated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// WebSocket close code.
    pub code: u16,
    /// Close reason text.
    pub reason: String,
}

impl CloseInfo {
    /// Creates close info.
    #[inline]
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a normal (code 1000) closure.
    #[inline]
    #[must_use]
    pub fn normal(reason: impl Into<String>) -> Self {
        Self::new(NORMAL_CLOSURE, reason)
    }

    /// Returns `true` for code 1000.
    #[inline]
    #[must_use]
    pub const fn is_normal(&self) -> bool {
        self.code == NORMAL_CLOSURE
    }
}

// ============================================================================
// LinkEvent
// ============================================================================

/// What happened on a link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEventKind {
    /// Handshake completed.
    Opened,
    /// Text frame received.
    Message(String),
    /// Transport-level error; a `Closed` follows.
    Error(String),
    /// Link terminated. `None` when no close frame was received.
    Closed(Option<CloseInfo>),
}

/// A link notification tagged with the link it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEvent {
    /// Originating link.
    pub link: LinkId,
    /// Notification.
    pub kind: LinkEventKind,
}

// ============================================================================
// LinkEventSender
// ============================================================================

/// Channel a link reports its notifications on.
#[derive(Debug, Clone)]
pub struct LinkEventSender {
    link: LinkId,
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl LinkEventSender {
    pub(crate) fn new(link: LinkId, tx: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self { link, tx }
    }

    /// Returns the id of the link this sender reports for.
    #[inline]
    #[must_use]
    pub const fn link(&self) -> LinkId {
        self.link
    }

    /// Reports a completed handshake.
    pub fn opened(&self) {
        self.send(LinkEventKind::Opened);
    }

    /// Reports an inbound text frame.
    pub fn message(&self, text: impl Into<String>) {
        self.send(LinkEventKind::Message(text.into()));
    }

    /// Reports a transport error.
    pub fn error(&self, message: impl Into<String>) {
        self.send(LinkEventKind::Error(message.into()));
    }

    /// Reports link termination.
    pub fn closed(&self, close: Option<CloseInfo>) {
        self.send(LinkEventKind::Closed(close));
    }

    fn send(&self, kind: LinkEventKind) {
        // The driver may already be gone; nobody is left to notify.
        if self
            .tx
            .send(LinkEvent {
                link: self.link,
                kind,
            })
            .is_err()
        {
            trace!(link = %self.link, "Link event dropped, driver stopped");
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Factory for links. One implementation per backend.
pub trait Transport: Send + Sync + 'static {
    /// Starts opening a link to `endpoint`.
    ///
    /// Returning `Ok` means construction succeeded; the handshake result
    /// arrives later as `Opened` or `Error` + `Closed` on `events`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Construction`] if the link cannot be created
    /// at all (e.g. an unusable endpoint).
    fn open(&self, endpoint: &Endpoint, events: LinkEventSender) -> Result<Box<dyn Link>>;
}

/// A single transport connection.
pub trait Link: Send {
    /// Queues a text frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConnectionClosed`] if the link is gone.
    fn send(&self, text: String) -> Result<()>;

    /// Closes the link with the given code and reason.
    fn close(&self, close: CloseInfo);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_info() {
        assert!(CloseInfo::normal("Manual disconnect").is_normal());
        assert!(!CloseInfo::new(1006, "").is_normal());
    }

    #[test]
    fn test_sender_tags_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = LinkEventSender::new(LinkId::new(3), tx);

        sender.opened();
        sender.message("hello");
        sender.closed(None);

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .inspect(|event| assert_eq!(event.link, LinkId::new(3)))
            .map(|event| event.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LinkEventKind::Opened,
                LinkEventKind::Message("hello".into()),
                LinkEventKind::Closed(None),
            ]
        );
    }

    #[test]
    fn test_sender_survives_dropped_driver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        LinkEventSender::new(LinkId::new(1), tx).error("late");
    }
}
