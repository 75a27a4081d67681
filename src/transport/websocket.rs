use super::{ConnectionId, Transport, TransportEvent};
use crate::infrastructure::TaskManager;
use crate::messaging::{ConnectionEvent, EventSender};
use crate::types::{KeepaliveError, Result};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// [`Transport`] over tokio-tungstenite WebSocket connections.
///
/// Every connection runs in its own task that performs the handshake, then
/// forwards inbound text frames as events and writes queued outbound frames.
pub struct WebSocketTransport {
    events: EventSender,
    next_id: u64,
    outbound: HashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
    tasks: TaskManager,
}

impl WebSocketTransport {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            next_id: 0,
            outbound: HashMap::new(),
            tasks: TaskManager::new(),
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, url: &str) -> Result<ConnectionId> {
        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);

        // Connections whose task already ended no longer need bookkeeping
        self.tasks.prune();
        self.outbound.retain(|_, tx| !tx.is_closed());

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.outbound.insert(id, out_tx);
        self.tasks.spawn(
            id,
            run_connection(id, url.to_string(), out_rx, self.events.clone()),
        );

        Ok(id)
    }

    fn send(&mut self, id: ConnectionId, text: &str) -> Result<()> {
        let tx = self.outbound.get(&id).ok_or(KeepaliveError::NotConnected)?;
        tx.send(Message::text(text.to_owned()))
            .map_err(|_| KeepaliveError::NotConnected)
    }

    fn close(&mut self, id: ConnectionId) {
        // Dropping the queue makes the task send a close frame and finish
        if self.outbound.remove(&id).is_some() {
            self.tasks.release(id);
            tracing::debug!("Closing WebSocket connection {}", id);
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.tasks.prune();
        if !self.tasks.is_empty() {
            tracing::debug!("Aborting {} WebSocket connection task(s)", self.tasks.len());
        }
        self.tasks.abort_all();
    }
}

async fn run_connection(
    id: ConnectionId,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: EventSender,
) {
    let post = |event: TransportEvent| {
        if events.send(ConnectionEvent::transport(id, event)).is_err() {
            tracing::debug!("Event loop gone, dropping event for connection {}", id);
        }
    };

    tracing::debug!("Opening WebSocket connection {} to {}", id, url);
    let ws_stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::error!("WebSocket handshake with {} failed: {}", url, e);
            post(TransportEvent::Error(e.to_string()));
            return;
        }
    };
    post(TransportEvent::Opened);

    let (mut write_half, mut read_half) = ws_stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    if let Err(e) = write_half.send(message).await {
                        tracing::error!("WebSocket write error on {}: {}", id, e);
                        post(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    if let Err(e) = write_half.close().await {
                        tracing::debug!("Close handshake on {} failed: {}", id, e);
                    }
                    post(TransportEvent::Closed);
                    break;
                }
            },
            incoming = read_half.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    post(TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Close(frame))) => {
                    if let Some(close_frame) = frame {
                        tracing::info!(
                            "Server closed connection {}: code={:?}, reason='{}'",
                            id,
                            close_frame.code,
                            close_frame.reason
                        );
                    } else {
                        tracing::info!("Server closed connection {} without close frame", id);
                    }
                    post(TransportEvent::Closed);
                    break;
                }
                Some(Ok(Message::Ping(data))) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Some(Ok(Message::Pong(data))) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Some(Ok(Message::Frame(_))) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Some(Err(e)) => {
                    tracing::error!("WebSocket read error on {}: {}", id, e);
                    post(TransportEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    post(TransportEvent::Closed);
                    break;
                }
            },
        }
    }

    tracing::debug!("Connection task {} finished", id);
}
