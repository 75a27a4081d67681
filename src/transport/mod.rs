//! Duplex text transport used by the connection manager.
//!
//! A transport opens connections, sends text over them and closes them.
//! Everything it observes afterwards (open, inbound text, failure, close) is
//! reported asynchronously as a [`TransportEvent`] posted into the client's
//! event channel, tagged with the [`ConnectionId`] it belongs to.

mod websocket;

pub use websocket::WebSocketTransport;

use crate::types::Result;
use std::fmt;

/// Identifies one transport connection for its whole lifetime.
///
/// Ids are never reused by a transport, so events from a connection that has
/// since been replaced can be told apart from events of the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Notifications a transport reports about one of its connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The handshake completed and the connection can carry data
    Opened,
    /// A text payload arrived
    Message(String),
    /// The connection failed (handshake, read or write error)
    Error(String),
    /// The peer closed the connection
    Closed,
}

/// Raw open/send/close capability over a message-oriented duplex channel.
pub trait Transport: Send + 'static {
    /// Starts opening a connection to `url`.
    ///
    /// Returns as soon as the attempt is under way; success or failure is
    /// reported later through [`TransportEvent::Opened`] or
    /// [`TransportEvent::Error`].
    fn open(&mut self, url: &str) -> Result<ConnectionId>;

    /// Queues a text frame on the given connection.
    fn send(&mut self, id: ConnectionId, text: &str) -> Result<()>;

    /// Closes the connection. Unknown ids are ignored.
    fn close(&mut self, id: ConnectionId);
}
