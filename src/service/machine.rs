//! Connection state machine.
//!
//! A synchronous transition function: every [`Input`] yields the
//! [`Effect`]s the driver must carry out. No I/O happens here, which keeps
//! the reconnection policy in one place for every transport backend.
//!
//! # States
//!
//! ```text
//! Disconnected ──connect──► Connecting ──opened──► Connected
//!                               ▲                      │ abnormal close
//!                               │ timer                ▼
//!                               └──────────────── Reconnecting ──ceiling──► Failed
//!
//! any state ──disconnect──► Disconnected
//! ```
//!
//! # Invariants
//!
//! - At most one link is live; notifications from any other link are ignored
//! - The attempt counter is zeroed on every `connected` transition
//! - At most one reconnect timer is pending
//! - A normal (1000) closure never schedules a reconnect

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::config::SocketOptions;
use crate::error::Error;
use crate::events::SocketEvent;
use crate::identifiers::LinkId;
use crate::protocol::{Command, InboundMessage};
use crate::transport::{CloseInfo, Endpoint, LinkEvent, LinkEventKind};

// ============================================================================
// Constants
// ============================================================================

/// Close reason sent on a caller-initiated disconnect.
pub const MANUAL_DISCONNECT_REASON: &str = "Manual disconnect";

/// Close reason sent when a newer link replaces an unfinished one.
const SUPERSEDED_REASON: &str = "Superseded";

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the camera socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No link and no pending attempt.
    #[default]
    Disconnected,
    /// Link opening.
    Connecting,
    /// Link open.
    Connected,
    /// Waiting for the reconnect timer.
    Reconnecting,
    /// Reconnect ceiling reached; waiting for a manual `connect`.
    Failed,
}

impl ConnectionState {
    /// Returns `true` while a link is being opened or re-opened.
    #[inline]
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

// ============================================================================
// Input / Effect
// ============================================================================

/// Something that happened to the service.
#[derive(Debug)]
pub(crate) enum Input {
    /// Caller asked to connect to a backend address.
    Connect(String),
    /// Caller asked to disconnect.
    Disconnect,
    /// Caller asked to send a command.
    Send(Command),
    /// A link reported a notification.
    Link(LinkEvent),
    /// The transport refused to create a link.
    OpenFailed { link: LinkId, error: Error },
    /// The reconnect timer fired.
    ReconnectDue,
}

/// Something the driver must do.
#[derive(Debug)]
pub(crate) enum Effect {
    /// Open a new link.
    Open { link: LinkId, endpoint: Endpoint },
    /// Close a link.
    Close { link: LinkId, close: CloseInfo },
    /// Forget a link that has already terminated.
    Release { link: LinkId },
    /// Send a text frame on a link.
    Transmit { link: LinkId, text: String },
    /// Replace any pending reconnect timer with a new one.
    ScheduleReconnect(Duration),
    /// Drop the pending reconnect timer.
    CancelReconnect,
    /// Emit an event to subscribers.
    Emit(SocketEvent),
}

// ============================================================================
// Machine
// ============================================================================

/// Connection state plus reconnection bookkeeping.
#[derive(Debug)]
pub(crate) struct Machine {
    state: ConnectionState,
    reconnect_delay: Duration,
    max_attempts: u32,
    endpoint_path: String,
    endpoint: Option<Endpoint>,
    attempts: u32,
    last_link: LinkId,
    live: Option<LinkId>,
    timer_pending: bool,
}

impl Machine {
    pub(crate) fn new(options: &SocketOptions) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay: options.reconnect_delay,
            max_attempts: options.max_reconnect_attempts,
            endpoint_path: options.endpoint_path.clone(),
            endpoint: None,
            attempts: 0,
            last_link: LinkId::default(),
            live: None,
            timer_pending: false,
        }
    }

    #[inline]
    pub(crate) const fn state(&self) -> ConnectionState {
        self.state
    }

    #[inline]
    pub(crate) const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(test)]
    pub(crate) const fn live_link(&self) -> Option<LinkId> {
        self.live
    }

    #[cfg(test)]
    pub(crate) const fn timer_pending(&self) -> bool {
        self.timer_pending
    }

    /// Applies one input and returns the resulting effects, in order.
    pub(crate) fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            Input::Connect(address) => self.on_connect(&address, &mut effects),
            Input::Disconnect => self.on_disconnect(&mut effects),
            Input::Send(command) => self.on_send(&command, &mut effects),
            Input::Link(event) => self.on_link_event(event, &mut effects),
            Input::OpenFailed { link, error } => self.on_open_failed(link, error, &mut effects),
            Input::ReconnectDue => self.on_reconnect_due(&mut effects),
        }

        effects
    }

    // ========================================================================
    // Caller Inputs
    // ========================================================================

    fn on_connect(&mut self, address: &str, effects: &mut Vec<Effect>) {
        if self.state == ConnectionState::Connected {
            debug!("Already connected");
            return;
        }

        let endpoint = Endpoint::resolve_with_path(address, &self.endpoint_path);
        info!(%endpoint, "Connecting");

        self.attempts = 0;
        self.cancel_timer(effects);
        self.endpoint = Some(endpoint);
        self.open_link(effects);
    }

    fn on_disconnect(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_timer(effects);

        if let Some(link) = self.live.take() {
            info!(%link, "Disconnecting");
            effects.push(Effect::Close {
                link,
                close: CloseInfo::normal(MANUAL_DISCONNECT_REASON),
            });
        }

        if self.state == ConnectionState::Connected {
            effects.push(Effect::Emit(SocketEvent::Connected(false)));
        }

        self.state = ConnectionState::Disconnected;
        self.attempts = 0;
        self.endpoint = None;
    }

    fn on_send(&mut self, command: &Command, effects: &mut Vec<Effect>) {
        let (ConnectionState::Connected, Some(link)) = (self.state, self.live) else {
            debug!(command = command.name(), "Not connected, command dropped");
            return;
        };

        match command.encode() {
            Ok(text) => {
                trace!(%link, command = command.name(), "Sending command");
                effects.push(Effect::Transmit { link, text });
            }
            Err(e) => warn!(command = command.name(), error = %e, "Failed to encode command"),
        }
    }

    // ========================================================================
    // Link Inputs
    // ========================================================================

    fn on_link_event(&mut self, event: LinkEvent, effects: &mut Vec<Effect>) {
        if self.live != Some(event.link) {
            trace!(link = %event.link, "Ignoring event from stale link");
            return;
        }

        match event.kind {
            LinkEventKind::Opened => {
                info!(link = %event.link, "WebSocket connected");
                self.state = ConnectionState::Connected;
                self.attempts = 0;
                self.cancel_timer(effects);
                effects.push(Effect::Emit(SocketEvent::Connected(true)));
            }

            LinkEventKind::Message(text) => Self::on_message(&text, effects),

            LinkEventKind::Error(message) => {
                error!(link = %event.link, %message, "WebSocket error");
                effects.push(Effect::Emit(SocketEvent::Error(Error::transport(message))));
            }

            LinkEventKind::Closed(close) => {
                info!(link = %event.link, ?close, "WebSocket disconnected");
                self.live = None;
                effects.push(Effect::Release { link: event.link });

                if self.state == ConnectionState::Connected {
                    effects.push(Effect::Emit(SocketEvent::Connected(false)));
                }

                if close.as_ref().is_some_and(CloseInfo::is_normal) {
                    self.state = ConnectionState::Disconnected;
                } else {
                    self.schedule_reconnect(effects);
                }
            }
        }
    }

    fn on_message(text: &str, effects: &mut Vec<Effect>) {
        match InboundMessage::decode(text) {
            Ok(InboundMessage::Frame(frame)) => {
                trace!(timestamp = frame.timestamp(), "Frame received");
                effects.push(Effect::Emit(SocketEvent::Frame(frame)));
            }
            Ok(InboundMessage::Status(data)) => {
                effects.push(Effect::Emit(SocketEvent::Status(data)));
            }
            Ok(InboundMessage::Unknown(kind)) => {
                debug!(%kind, "Unknown message type");
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse WebSocket message");
            }
        }
    }

    fn on_open_failed(&mut self, link: LinkId, error: Error, effects: &mut Vec<Effect>) {
        if self.live != Some(link) {
            return;
        }

        error!(%link, error = %error, "Failed to create WebSocket");
        self.live = None;
        effects.push(Effect::Emit(SocketEvent::Error(error)));
        self.schedule_reconnect(effects);
    }

    fn on_reconnect_due(&mut self, effects: &mut Vec<Effect>) {
        if !self.timer_pending {
            return;
        }
        self.timer_pending = false;

        if self.state == ConnectionState::Reconnecting {
            self.open_link(effects);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Tears down any stale link and opens a new one.
    fn open_link(&mut self, effects: &mut Vec<Effect>) {
        if let Some(stale) = self.live.take() {
            effects.push(Effect::Close {
                link: stale,
                close: CloseInfo::normal(SUPERSEDED_REASON),
            });
        }

        let Some(endpoint) = self.endpoint.clone() else {
            self.state = ConnectionState::Disconnected;
            return;
        };

        let link = self.last_link.next();
        self.last_link = link;
        self.live = Some(link);
        self.state = ConnectionState::Connecting;

        effects.push(Effect::Open { link, endpoint });
    }

    /// Applies the reconnection policy after an abnormal closure.
    fn schedule_reconnect(&mut self, effects: &mut Vec<Effect>) {
        self.attempts += 1;

        if self.attempts >= self.max_attempts {
            error!(attempts = self.attempts, "Max reconnection attempts reached");
            self.state = ConnectionState::Failed;
            self.cancel_timer(effects);
            effects.push(Effect::Emit(SocketEvent::Error(Error::reconnect_exhausted(
                self.attempts,
            ))));
            return;
        }

        info!(
            attempt = self.attempts,
            max = self.max_attempts,
            delay_ms = self.reconnect_delay.as_millis() as u64,
            "Reconnecting"
        );
        self.state = ConnectionState::Reconnecting;
        self.timer_pending = true;
        effects.push(Effect::ScheduleReconnect(self.reconnect_delay));
    }

    fn cancel_timer(&mut self, effects: &mut Vec<Effect>) {
        if self.timer_pending {
            self.timer_pending = false;
            effects.push(Effect::CancelReconnect);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::Frame;

    fn machine() -> Machine {
        Machine::new(&SocketOptions::new())
    }

    fn link_event(link: LinkId, kind: LinkEventKind) -> Input {
        Input::Link(LinkEvent { link, kind })
    }

    fn abnormal() -> LinkEventKind {
        LinkEventKind::Closed(Some(CloseInfo::new(1006, "")))
    }

    /// Connects and completes the handshake; returns the live link.
    fn connected(machine: &mut Machine) -> LinkId {
        machine.handle(Input::Connect("http://cam.local:3000".into()));
        let link = machine.live_link().expect("live link");
        machine.handle(link_event(link, LinkEventKind::Opened));
        link
    }

    fn emitted(effects: &[Effect]) -> Vec<&SocketEvent> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    fn opens(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Open { .. }))
            .count()
    }

    #[test]
    fn test_connect_resolves_endpoint_and_opens() {
        let mut m = machine();
        let effects = m.handle(Input::Connect("https://host:8443/api".into()));

        assert_eq!(m.state(), ConnectionState::Connecting);
        match effects.as_slice() {
            [Effect::Open { link, endpoint }] => {
                assert_eq!(*link, LinkId::new(1));
                assert_eq!(endpoint.to_string(), "wss://host:8443/ws");
            }
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    #[test]
    fn test_opened_emits_connected_and_resets_counter() {
        let mut m = machine();
        let link = connected(&mut m);
        m.handle(link_event(link, abnormal()));
        assert_eq!(m.attempts(), 1);

        m.handle(Input::ReconnectDue);
        let link = m.live_link().expect("reopened");
        let effects = m.handle(link_event(link, LinkEventKind::Opened));

        assert_eq!(m.state(), ConnectionState::Connected);
        assert_eq!(m.attempts(), 0);
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Connected(true)]
        ));
    }

    #[test]
    fn test_connect_while_connected_is_noop() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(Input::Connect("http://elsewhere:1".into()));
        assert!(effects.is_empty());
        assert_eq!(m.live_link(), Some(link));
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_connect_while_connecting_supersedes_link() {
        let mut m = machine();
        m.handle(Input::Connect("http://a:1".into()));
        let first = m.live_link().expect("first link");

        let effects = m.handle(Input::Connect("http://b:2".into()));
        let second = m.live_link().expect("second link");
        assert_ne!(first, second);
        assert!(matches!(
            effects.first(),
            Some(Effect::Close { link, close }) if *link == first && close.is_normal()
        ));
        assert_eq!(opens(&effects), 1);

        // The superseded link can no longer move the machine.
        let effects = m.handle(link_event(first, LinkEventKind::Opened));
        assert!(effects.is_empty());
        assert_eq!(m.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_abnormal_close_schedules_single_timer() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(link_event(link, abnormal()));
        assert_eq!(m.state(), ConnectionState::Reconnecting);
        assert!(m.timer_pending());
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Connected(false)]
        ));
        assert!(matches!(
            effects.last(),
            Some(Effect::ScheduleReconnect(d)) if *d == Duration::from_secs(2)
        ));

        let effects = m.handle(Input::ReconnectDue);
        assert_eq!(opens(&effects), 1);
        assert_eq!(m.state(), ConnectionState::Connecting);
        assert!(!m.timer_pending());

        // A second expiry without a pending timer does nothing.
        assert!(m.handle(Input::ReconnectDue).is_empty());
    }

    #[test]
    fn test_close_releases_link() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(link_event(link, abnormal()));
        assert!(matches!(
            effects.first(),
            Some(Effect::Release { link: l }) if *l == link
        ));
        assert_eq!(m.live_link(), None);
    }

    #[test]
    fn test_close_without_code_is_abnormal() {
        let mut m = machine();
        let link = connected(&mut m);
        m.handle(link_event(link, LinkEventKind::Closed(None)));
        assert_eq!(m.state(), ConnectionState::Reconnecting);
    }

    #[test]
    fn test_normal_close_does_not_reconnect() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(link_event(
            link,
            LinkEventKind::Closed(Some(CloseInfo::normal("server shutdown"))),
        ));
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert!(!m.timer_pending());
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::ScheduleReconnect(_)))
        );
    }

    #[test]
    fn test_ceiling_reached_on_fifth_abnormal_closure() {
        let mut m = machine();
        m.handle(Input::Connect("http://cam.local:3000".into()));

        let mut timers = 0;
        for closure in 1..=5 {
            let link = m.live_link().expect("live link");
            let effects = m.handle(link_event(link, LinkEventKind::Closed(None)));
            timers += effects
                .iter()
                .filter(|e| matches!(e, Effect::ScheduleReconnect(_)))
                .count();

            if closure < 5 {
                assert_eq!(m.state(), ConnectionState::Reconnecting);
                assert!(emitted(&effects).is_empty());
                m.handle(Input::ReconnectDue);
            } else {
                assert_eq!(m.state(), ConnectionState::Failed);
                assert!(matches!(
                    emitted(&effects).as_slice(),
                    [SocketEvent::Error(Error::ReconnectExhausted { attempts: 5 })]
                ));
            }
        }

        assert_eq!(timers, 4);
        assert!(!m.timer_pending());
        assert!(m.handle(Input::ReconnectDue).is_empty());
    }

    #[test]
    fn test_manual_connect_after_failure_resets_counter() {
        let mut m = Machine::new(&SocketOptions::new().with_max_reconnect_attempts(1));
        m.handle(Input::Connect("http://cam.local:3000".into()));
        let link = m.live_link().expect("live link");
        m.handle(link_event(link, LinkEventKind::Closed(None)));
        assert_eq!(m.state(), ConnectionState::Failed);

        let effects = m.handle(Input::Connect("http://cam.local:3000".into()));
        assert_eq!(opens(&effects), 1);
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_disconnect_closes_normally_and_resets() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(Input::Disconnect);
        assert!(matches!(
            effects.first(),
            Some(Effect::Close { link: l, close })
                if *l == link && close.is_normal() && close.reason == MANUAL_DISCONNECT_REASON
        ));
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Connected(false)]
        ));
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.live_link(), None);

        // Late close from the old link schedules nothing.
        let effects = m.handle(link_event(link, abnormal()));
        assert!(effects.is_empty());
        assert!(!m.timer_pending());
    }

    #[test]
    fn test_disconnect_cancels_pending_timer() {
        let mut m = machine();
        let link = connected(&mut m);
        m.handle(link_event(link, abnormal()));
        assert!(m.timer_pending());

        let effects = m.handle(Input::Disconnect);
        assert!(matches!(effects.as_slice(), [Effect::CancelReconnect]));
        assert!(m.handle(Input::ReconnectDue).is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_when_idle_is_safe() {
        let mut m = machine();
        assert!(m.handle(Input::Disconnect).is_empty());
        assert_eq!(m.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_open_failure_emits_error_and_retries() {
        let mut m = machine();
        m.handle(Input::Connect("http://bad host:1".into()));
        let link = m.live_link().expect("live link");

        let effects = m.handle(Input::OpenFailed {
            link,
            error: Error::construction("ws://bad host:1/ws", "invalid uri"),
        });
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Error(Error::Construction { .. })]
        ));
        assert_eq!(m.state(), ConnectionState::Reconnecting);
        assert_eq!(m.attempts(), 1);
    }

    #[test]
    fn test_messages_dispatched_by_type() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(link_event(
            link,
            LinkEventKind::Message(r#"{"type":"frame","image":"AAA=","timestamp":9}"#.into()),
        ));
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Frame(frame)] if *frame == Frame::new("AAA=", 9)
        ));

        let effects = m.handle(link_event(
            link,
            LinkEventKind::Message(r#"{"type":"status","data":{"led":true}}"#.into()),
        ));
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Status(data)] if data["led"] == true
        ));
    }

    #[test]
    fn test_unknown_and_malformed_messages_emit_nothing() {
        let mut m = machine();
        let link = connected(&mut m);

        for raw in [r#"{"type":"bogus"}"#, "{not json", r#"{"type":"frame"}"#] {
            let effects = m.handle(link_event(link, LinkEventKind::Message(raw.into())));
            assert!(effects.is_empty(), "{raw}");
        }
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_transport_error_emitted() {
        let mut m = machine();
        let link = connected(&mut m);

        let effects = m.handle(link_event(link, LinkEventKind::Error("reset".into())));
        assert!(matches!(
            emitted(&effects).as_slice(),
            [SocketEvent::Error(Error::Transport { message })] if message == "reset"
        ));
        assert_eq!(m.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_send_requires_connection() {
        let mut m = machine();
        assert!(m.handle(Input::Send(Command::RequestFrame)).is_empty());

        let link = connected(&mut m);
        let effects = m.handle(Input::Send(Command::Capture));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Transmit { link: l, text }] if *l == link && text == r#"{"type":"capture"}"#
        ));
    }

    #[test]
    fn test_custom_endpoint_path() {
        let mut m = Machine::new(&SocketOptions::new().with_endpoint_path("/stream"));
        let effects = m.handle(Input::Connect("http://host:3000".into()));
        assert!(matches!(
            effects.as_slice(),
            [Effect::Open { endpoint, .. }] if endpoint.to_string() == "ws://host:3000/stream"
        ));
    }
}
