use crate::transport::{ConnectionId, TransportEvent};
use crate::types::Result;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Consumer of application payloads received on the channel
pub type MessageHandler = Arc<dyn Fn(String) + Send + Sync + 'static>;

/// Sending half of the client event loop channel
pub type EventSender = mpsc::UnboundedSender<ConnectionEvent>;

/// Receiving half of the client event loop channel
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// Creates the channel every producer (public handle, transport, heartbeat
/// ticker) posts into and the event loop drains.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Everything that can change the connection state, processed one at a time
pub enum ConnectionEvent {
    /// Caller asked to connect
    Connect {
        address: Option<String>,
        handler: Option<MessageHandler>,
    },
    /// Caller asked to disconnect
    Disconnect,
    /// Caller wants to send application data
    Send {
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Something happened on a transport connection
    Transport {
        id: ConnectionId,
        event: TransportEvent,
    },
    /// Heartbeat timer fired
    Tick,
    /// Tear everything down and stop the event loop
    Shutdown,
}

impl ConnectionEvent {
    pub fn transport(id: ConnectionId, event: TransportEvent) -> Self {
        Self::Transport { id, event }
    }
}

impl fmt::Debug for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { address, handler } => f
                .debug_struct("Connect")
                .field("address", address)
                .field("handler", &handler.is_some())
                .finish(),
            Self::Disconnect => f.write_str("Disconnect"),
            Self::Send { text, .. } => f.debug_struct("Send").field("text", text).finish(),
            Self::Transport { id, event } => f
                .debug_struct("Transport")
                .field("id", id)
                .field("event", event)
                .finish(),
            Self::Tick => f.write_str("Tick"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_handler() {
        let handler: MessageHandler = Arc::new(|_| {});
        let event = ConnectionEvent::Connect {
            address: Some("/ws/chat".to_string()),
            handler: Some(handler),
        };

        let rendered = format!("{:?}", event);
        assert_eq!(
            rendered,
            r#"Connect { address: Some("/ws/chat"), handler: true }"#
        );
    }

    #[test]
    fn test_transport_constructor() {
        let event = ConnectionEvent::transport(ConnectionId::new(3), TransportEvent::Opened);
        assert!(matches!(
            event,
            ConnectionEvent::Transport { id, event: TransportEvent::Opened } if id == ConnectionId::new(3)
        ));
    }
}
