use super::{
    ClientConfig, ConnectionManager, ConnectionState, KeepaliveClientBuilder, KeepaliveOptions,
};
use crate::messaging::{ConnectionEvent, EventReceiver, EventSender, MessageHandler};
use crate::transport::Transport;
use crate::types::{KeepaliveError, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a keepalive connection.
///
/// `KeepaliveClient` keeps one logical channel open over an unreliable
/// WebSocket link. Once opened, it probes the peer with heartbeats and, when a
/// transport error or a missing acknowledgment reveals the link is gone,
/// reconnects to the same address with the same message handler. The message
/// handler is never told about connection loss or reconnection.
///
/// All state lives in a background event loop; this handle only posts
/// requests to it and is cheap to clone. Dropping the last clone shuts the
/// event loop down.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ws_keepalive::{KeepaliveClient, KeepaliveOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = KeepaliveClient::new(KeepaliveOptions {
///     base_url: Some("https://example.com".to_string()),
///     ..Default::default()
/// })?;
///
/// client.connect(
///     Some("/ws/chat"),
///     Some(Arc::new(|text: String| println!("received {}", text))),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct KeepaliveClient {
    pub(crate) config: ClientConfig,
    pub(crate) events: EventSender,
    pub(crate) state: watch::Receiver<ConnectionState>,
    pub(crate) event_loop: Arc<EventLoopGuard>,
}

/// Shared by all clones of a client; stops the event loop when the last one goes away
pub(crate) struct EventLoopGuard {
    events: EventSender,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EventLoopGuard {
    pub(crate) fn new(events: EventSender, handle: JoinHandle<()>) -> Self {
        Self {
            events,
            handle: Mutex::new(Some(handle)),
        }
    }
}

impl Drop for EventLoopGuard {
    fn drop(&mut self) {
        // The manager holds senders of its own, so the channel never closes by itself
        if self.events.send(ConnectionEvent::Shutdown).is_ok() {
            tracing::debug!("Last client handle dropped, stopping event loop");
        }
    }
}

impl KeepaliveClient {
    /// Creates a client over WebSocket connections and starts its event loop.
    ///
    /// Must be called from within a tokio runtime. No connection is opened
    /// until [`connect()`](Self::connect) is called.
    ///
    /// # Errors
    ///
    /// Returns [`KeepaliveError::Config`] for a zero tick interval or ack
    /// timeout, and [`KeepaliveError::UrlParse`] for a malformed base URL.
    pub fn new(options: KeepaliveOptions) -> Result<Self> {
        KeepaliveClientBuilder::new(options).map(|builder| builder.build())
    }

    /// Opens the channel at `address` (default address when `None`), routing
    /// application payloads to `handler`.
    ///
    /// Does nothing if a connection is already connecting or open. The
    /// address and handler are remembered and reused by every automatic
    /// reconnect.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved to a WebSocket URL
    /// or the client has been shut down.
    pub fn connect(&self, address: Option<&str>, handler: Option<MessageHandler>) -> Result<()> {
        let target = address.unwrap_or(&self.config.default_address);
        self.config.resolver.resolve(target)?;

        self.post(ConnectionEvent::Connect {
            address: address.map(str::to_owned),
            handler,
        })
    }

    /// Closes the connection and stops the heartbeat. No-op when disconnected.
    pub fn disconnect(&self) -> Result<()> {
        self.post(ConnectionEvent::Disconnect)
    }

    /// Sends application data over the open connection.
    ///
    /// # Errors
    ///
    /// [`KeepaliveError::NotConnected`] unless the connection is open,
    /// [`KeepaliveError::ReservedPayload`] when `text` is the probe token.
    pub async fn send(&self, text: impl Into<String>) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.post(ConnectionEvent::Send {
            text: text.into(),
            reply,
        })?;

        response.await.map_err(|_| KeepaliveError::Closed)?
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Watch channel following every connection state transition
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Disconnects, stops the event loop and waits for it to finish
    pub async fn shutdown(&self) -> Result<()> {
        if self.events.send(ConnectionEvent::Shutdown).is_err() {
            tracing::debug!("Event loop already stopped");
        }

        let handle = self.event_loop.handle.lock().await.take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| KeepaliveError::Connection(format!("event loop failed: {}", e)))?;
        }
        Ok(())
    }

    fn post(&self, event: ConnectionEvent) -> Result<()> {
        self.events.send(event).map_err(|_| KeepaliveError::Closed)
    }
}

/// Drains the event channel, applying each event to the manager in order
pub(crate) async fn run_event_loop<T: Transport>(
    mut manager: ConnectionManager<T>,
    mut events: EventReceiver,
) {
    tracing::debug!("Starting event loop");
    while let Some(event) = events.recv().await {
        if manager.handle_event(event, Instant::now()).is_break() {
            break;
        }
    }
    tracing::debug!("Event loop finished");
}
