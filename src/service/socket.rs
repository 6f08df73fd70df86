//! Camera socket service.
//!
//! [`CameraSocket`] is a thin handle over a driver task. The driver owns the
//! state machine, the live link and the reconnect timer, and reacts to three
//! sources from one `select!` loop:
//!
//! ```text
//!   caller ──ServiceCommand──┐
//!   links  ──LinkEvent───────┼──► Machine::handle ──► Effects
//!   timer  ──ReconnectDue────┘         │
//!                                      └──► shared state (sync reads)
//! ```
//!
//! Every input is applied to the machine first and the shared state is
//! updated before any effect runs, so subscribers observe a state consistent
//! with the event they are handed.
//!
//! Handlers run on the driver task. A handler that blocks stalls frame
//! delivery and reconnection until it returns.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Sleep, sleep};
use tracing::{debug, error, info, trace, warn};

use crate::config::SocketOptions;
use crate::error::{Error, Result};
use crate::events::{EventBus, EventHandler, EventKind};
use crate::identifiers::{LinkId, SubscriptionId};
use crate::protocol::{Command, Frame};
use crate::transport::{CloseInfo, Link, LinkEvent, LinkEventSender, Transport, WebSocketTransport};

use super::machine::{ConnectionState, Effect, Input, Machine};

// ============================================================================
// Constants
// ============================================================================

/// Close reason sent when the service shuts down with a live link.
const DISPOSED_REASON: &str = "Service disposed";

// ============================================================================
// ServiceCommand
// ============================================================================

/// Caller requests forwarded to the driver task.
#[derive(Debug)]
enum ServiceCommand {
    Connect(String),
    Disconnect,
    Send(Command),
    Shutdown,
}

// ============================================================================
// Shared
// ============================================================================

/// State readable from any thread without a round trip to the driver.
#[derive(Default)]
struct Shared {
    published: RwLock<Published>,
    bus: EventBus,
}

/// Connection state as seen by the handle.
///
/// While a disconnect is queued but not yet applied by the driver, the
/// published state stays `Disconnected` whatever the backlog does.
#[derive(Debug, Default)]
struct Published {
    state: ConnectionState,
    pending_disconnects: usize,
}

impl Published {
    fn publish(&mut self, state: ConnectionState) {
        self.state = if self.pending_disconnects > 0 {
            ConnectionState::Disconnected
        } else {
            state
        };
    }
}

// ============================================================================
// CameraSocket
// ============================================================================

/// Live camera feed client.
///
/// Connects to a backend's socket endpoint, dispatches frames and status
/// updates to subscribers, and reconnects after abnormal closures.
///
/// # Example
///
/// ```ignore
/// let socket = CameraSocket::new(SocketOptions::new())?;
/// socket.on_frame(|frame| println!("frame at {}", frame.timestamp()));
/// socket.connect("http://192.168.0.115:3000");
/// socket.request_frame();
/// ```
pub struct CameraSocket {
    command_tx: mpsc::UnboundedSender<ServiceCommand>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for CameraSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSocket")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CameraSocket - Construction
// ============================================================================

impl CameraSocket {
    /// Creates a service backed by the WebSocket transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid or no tokio
    /// runtime is available.
    pub fn new(options: SocketOptions) -> Result<Self> {
        let transport = WebSocketTransport::new(options.connect_timeout);
        Self::with_transport(options, transport)
    }

    /// Creates a service backed by a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid or no tokio
    /// runtime is available.
    pub fn with_transport<T: Transport>(options: SocketOptions, transport: T) -> Result<Self> {
        options.validate()?;

        let runtime = Handle::try_current()
            .map_err(|_| Error::config("CameraSocket must be created inside a tokio runtime"))?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        let driver = Driver {
            machine: Machine::new(&options),
            transport: Box::new(transport),
            shared: Arc::clone(&shared),
            link: None,
            reconnect: None,
            link_tx,
            link_rx,
        };

        runtime.spawn(driver.run(command_rx));
        debug!(?options, "Camera socket created");

        Ok(Self { command_tx, shared })
    }
}

// ============================================================================
// CameraSocket - Connection
// ============================================================================

impl CameraSocket {
    /// Connects to a backend address (`http(s)://`, `ws(s)://` or bare host).
    ///
    /// A no-op while connected. Otherwise any pending reconnect timer is
    /// cancelled and the attempt counter restarts.
    ///
    /// Always handed to the driver: the handle's view may lag behind a
    /// queued `disconnect`.
    pub fn connect(&self, address: impl Into<String>) {
        self.dispatch(ServiceCommand::Connect(address.into()));
    }

    /// Closes the link normally and removes every subscriber.
    ///
    /// Takes effect immediately for [`is_connected`](Self::is_connected)
    /// and subscribers; no reconnect follows.
    pub fn disconnect(&self) {
        self.shared.bus.clear();
        {
            let mut published = self.shared.published.write();
            published.pending_disconnects += 1;
            published.state = ConnectionState::Disconnected;
        }
        self.dispatch(ServiceCommand::Disconnect);
    }

    /// Returns `true` while the link is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.published.read().state
    }

    /// Sends a command. Dropped with a debug log when not connected.
    pub fn send(&self, command: Command) {
        if !self.is_connected() {
            debug!(command = command.name(), "Not connected, command dropped");
            return;
        }
        self.dispatch(ServiceCommand::Send(command));
    }

    /// Stops the driver task, closing any live link.
    pub fn dispose(self) {
        self.dispatch(ServiceCommand::Shutdown);
    }

    fn dispatch(&self, command: ServiceCommand) {
        if self.command_tx.send(command).is_err() {
            warn!("Camera socket driver stopped");
        }
    }
}

// ============================================================================
// CameraSocket - Subscriptions
// ============================================================================

impl CameraSocket {
    /// Registers a raw handler for `kind`.
    pub fn subscribe(&self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        self.shared.bus.subscribe(kind, handler)
    }

    /// Removes one registration. Returns `false` if it was not found.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        self.shared.bus.unsubscribe(kind, id)
    }

    /// Removes every registration for `kind`.
    pub fn unsubscribe_all(&self, kind: EventKind) {
        self.shared.bus.unsubscribe_all(kind);
    }

    /// Returns the number of handlers registered for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.shared.bus.len(kind)
    }

    /// Subscribes to connection state changes.
    pub fn on_connected<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.bus.on_connected(handler)
    }

    /// Subscribes to camera frames.
    pub fn on_frame<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        self.shared.bus.on_frame(handler)
    }

    /// Subscribes to device status updates.
    pub fn on_status<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.shared.bus.on_status(handler)
    }

    /// Subscribes to errors.
    pub fn on_error<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.shared.bus.on_error(handler)
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Owns the machine and everything it controls.
struct Driver {
    machine: Machine,
    transport: Box<dyn Transport>,
    shared: Arc<Shared>,
    link: Option<(LinkId, Box<dyn Link>)>,
    reconnect: Option<Pin<Box<Sleep>>>,
    link_tx: mpsc::UnboundedSender<LinkEvent>,
    link_rx: mpsc::UnboundedReceiver<LinkEvent>,
}

impl Driver {
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<ServiceCommand>) {
        debug!("Camera socket driver started");

        loop {
            let input = tokio::select! {
                command = command_rx.recv() => match command {
                    Some(ServiceCommand::Connect(address)) => Input::Connect(address),
                    Some(ServiceCommand::Disconnect) => Input::Disconnect,
                    Some(ServiceCommand::Send(command)) => Input::Send(command),
                    Some(ServiceCommand::Shutdown) | None => break,
                },

                Some(event) = self.link_rx.recv() => Input::Link(event),

                () = wait_reconnect(&mut self.reconnect) => Input::ReconnectDue,
            };

            if matches!(input, Input::ReconnectDue) {
                self.reconnect = None;
            }

            let disconnect = matches!(input, Input::Disconnect);
            self.process(input);
            if disconnect {
                let mut published = self.shared.published.write();
                published.pending_disconnects = published.pending_disconnects.saturating_sub(1);
                published.publish(self.machine.state());
            }
        }

        self.shutdown();
    }

    /// Applies an input and every follow-up input its effects produce.
    fn process(&mut self, input: Input) {
        let mut queue = VecDeque::from([input]);

        while let Some(input) = queue.pop_front() {
            let effects = self.machine.handle(input);
            self.shared.published.write().publish(self.machine.state());

            for effect in effects {
                if let Some(next) = self.execute(effect) {
                    queue.push_back(next);
                }
            }
        }
    }

    fn execute(&mut self, effect: Effect) -> Option<Input> {
        match effect {
            Effect::Open { link, endpoint } => {
                let events = LinkEventSender::new(link, self.link_tx.clone());
                match self.transport.open(&endpoint, events) {
                    Ok(handle) => {
                        trace!(%link, %endpoint, "Link created");
                        self.link = Some((link, handle));
                        None
                    }
                    Err(error) => Some(Input::OpenFailed { link, error }),
                }
            }

            Effect::Close { link, close } => {
                if let Some((_, handle)) = self.link.take_if(|(id, _)| *id == link) {
                    handle.close(close);
                }
                None
            }

            Effect::Release { link } => {
                if self.link.take_if(|(id, _)| *id == link).is_some() {
                    trace!(%link, "Link released");
                }
                None
            }

            Effect::Transmit { link, text } => {
                match &self.link {
                    Some((id, handle)) if *id == link => {
                        if let Err(e) = handle.send(text) {
                            warn!(%link, error = %e, "Failed to queue frame");
                        }
                    }
                    _ => debug!(%link, "Link gone, frame dropped"),
                }
                None
            }

            Effect::ScheduleReconnect(delay) => {
                self.reconnect = Some(Box::pin(sleep(delay)));
                None
            }

            Effect::CancelReconnect => {
                self.reconnect = None;
                None
            }

            Effect::Emit(event) => {
                self.shared.bus.emit(&event);
                None
            }
        }
    }

    fn shutdown(&mut self) {
        self.reconnect = None;

        if let Some((link, handle)) = self.link.take() {
            info!(%link, "Closing link on shutdown");
            handle.close(CloseInfo::normal(DISPOSED_REASON));
        }

        self.shared.published.write().state = ConnectionState::Disconnected;

        if self.machine.attempts() > 0 {
            error!(
                attempts = self.machine.attempts(),
                "Shut down while reconnecting"
            );
        }
        debug!("Camera socket driver terminated");
    }
}

/// Resolves when the reconnect timer fires; never resolves without one.
async fn wait_reconnect(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
