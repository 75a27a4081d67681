use super::{ChannelDescriptor, ClientConfig, ConnectionState};
use crate::infrastructure::{HeartbeatTimer, TickAction};
use crate::messaging::{ConnectionEvent, EventSender, MessageHandler, MessageRouter, Routed};
use crate::transport::{ConnectionId, Transport, TransportEvent};
use crate::types::constants::PROBE_TOKEN;
use crate::types::{KeepaliveError, Result};
use std::ops::ControlFlow;
use tokio::sync::watch;
use tokio::time::Instant;

/// Owns the single connection and drives it through its lifecycle.
///
/// Holds the connection handle, the channel descriptor and the heartbeat
/// timer together, and is only ever mutated by the event loop through
/// [`handle_event`](Self::handle_event). Transport errors and heartbeat
/// timeouts both end up in connection-loss handling, which tears the
/// connection down and immediately reopens the saved channel.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    config: ClientConfig,
    connection: Option<ConnectionId>,
    state: ConnectionState,
    descriptor: Option<ChannelDescriptor>,
    router: MessageRouter,
    heartbeat: HeartbeatTimer,
    state_tx: watch::Sender<ConnectionState>,
    reconnects: u64,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, config: ClientConfig, events: EventSender) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let heartbeat = HeartbeatTimer::new(config.heartbeat, events);

        Self {
            transport,
            config,
            connection: None,
            state: ConnectionState::Disconnected,
            descriptor: None,
            router: MessageRouter::default(),
            heartbeat,
            state_tx,
            reconnects: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Id of the tracked transport connection, if any
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn descriptor(&self) -> Option<&ChannelDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn heartbeat(&self) -> &HeartbeatTimer {
        &self.heartbeat
    }

    pub fn heartbeat_mut(&mut self) -> &mut HeartbeatTimer {
        &mut self.heartbeat
    }

    /// Number of automatic reconnects so far
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Watch channel following every state transition
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    fn set_state(&mut self, new_state: ConnectionState) {
        self.state = new_state;
        self.state_tx.send_replace(new_state);
    }

    /// Applies one event. Breaks once the loop must stop.
    pub fn handle_event(&mut self, event: ConnectionEvent, now: Instant) -> ControlFlow<()> {
        match event {
            ConnectionEvent::Connect { address, handler } => {
                if let Err(e) = self.connect(address, handler) {
                    tracing::error!("Connect failed: {}", e);
                }
            }
            ConnectionEvent::Disconnect => self.disconnect(),
            ConnectionEvent::Send { text, reply } => {
                let result = self.send(&text);
                if reply.send(result).is_err() {
                    tracing::debug!("Send caller went away before the reply");
                }
            }
            ConnectionEvent::Transport { id, event } => self.on_transport_event(id, event, now),
            ConnectionEvent::Tick => self.on_tick(now),
            ConnectionEvent::Shutdown => {
                self.disconnect();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Opens a connection to `address` (or the default address).
    ///
    /// No-op while a connection is connecting or open. Otherwise the address
    /// and handler become the channel descriptor used by later reconnects.
    pub fn connect(
        &mut self,
        address: Option<String>,
        handler: Option<MessageHandler>,
    ) -> Result<()> {
        if self.state.is_active() {
            tracing::debug!("Connection already {:?}, ignoring connect", self.state);
            return Ok(());
        }

        let address = address.unwrap_or_else(|| self.config.default_address.clone());
        let descriptor = ChannelDescriptor::new(address, handler);
        let url = self.config.resolver.resolve(&descriptor.address);
        self.router = MessageRouter::new(descriptor.handler.clone());
        self.descriptor = Some(descriptor);
        let url = url?;

        self.set_state(ConnectionState::Connecting);
        tracing::info!("Connecting to {}", url);

        match self.transport.open(&url) {
            Ok(id) => {
                self.connection = Some(id);
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Closes the tracked connection and stops the heartbeat.
    ///
    /// Idempotent. The channel descriptor is kept.
    pub fn disconnect(&mut self) {
        self.heartbeat.stop();

        let Some(id) = self.connection.take() else {
            return;
        };

        self.set_state(ConnectionState::Closing);
        self.transport.close(id);
        self.set_state(ConnectionState::Disconnected);

        tracing::info!("Disconnected connection {}", id);
    }

    /// Sends application data over the open connection
    pub fn send(&mut self, text: &str) -> Result<()> {
        if text == PROBE_TOKEN {
            return Err(KeepaliveError::ReservedPayload);
        }

        match self.connection {
            Some(id) if self.state == ConnectionState::Open => self.transport.send(id, text),
            _ => Err(KeepaliveError::NotConnected),
        }
    }

    fn on_transport_event(&mut self, id: ConnectionId, event: TransportEvent, now: Instant) {
        if self.connection != Some(id) {
            tracing::debug!("Ignoring {:?} from stale connection {}", event, id);
            return;
        }

        match event {
            TransportEvent::Opened => {
                self.set_state(ConnectionState::Open);
                self.heartbeat.reset(now);
                self.heartbeat.start();
                tracing::info!("Connection {} opened", id);
            }
            TransportEvent::Message(payload) => {
                if self.router.route(payload) == Routed::ProbeAck {
                    self.heartbeat.ack_received(now);
                }
            }
            TransportEvent::Error(reason) => {
                tracing::error!("Transport error on connection {}: {}", id, reason);
                self.handle_connection_loss();
            }
            TransportEvent::Closed => {
                // Clean close alone does not reconnect; the heartbeat notices a dead link
                tracing::info!("Connection {} closed", id);
            }
        }
    }

    fn on_tick(&mut self, now: Instant) {
        match self.heartbeat.tick(now) {
            TickAction::Idle => {}
            TickAction::SendProbe => self.send_probe(),
            TickAction::Timeout => {
                tracing::warn!("Heartbeat timeout, no probe acknowledgment received");
                self.handle_connection_loss();
            }
        }
    }

    fn send_probe(&mut self) {
        let Some(id) = self.connection else {
            tracing::warn!("Probe due without a connection");
            return;
        };

        match self.transport.send(id, PROBE_TOKEN) {
            Ok(()) => tracing::debug!("Sent heartbeat probe on connection {}", id),
            Err(e) => tracing::warn!("Failed to send heartbeat probe on {}: {}", id, e),
        }
    }

    /// Tears the connection down and reopens the saved channel right away
    fn handle_connection_loss(&mut self) {
        if self.connection.is_none() {
            tracing::debug!("Connection already cleared, skipping reconnect");
            return;
        }

        tracing::warn!("Connection lost");
        self.disconnect();
        self.heartbeat.stop();

        let Some(descriptor) = self.descriptor.clone() else {
            return;
        };

        self.reconnects += 1;
        tracing::info!(
            "Reconnecting to {} (reconnect #{})",
            descriptor.address,
            self.reconnects
        );

        if let Err(e) = self.connect(Some(descriptor.address), descriptor.handler) {
            tracing::error!("Reconnection attempt failed: {}", e);
        }
    }
}
