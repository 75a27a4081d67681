use super::core::EventLoopGuard;
use super::{ConnectionManager, KeepaliveClient};
use crate::infrastructure::{EndpointResolver, HeartbeatConfig};
use crate::messaging::{EventSender, event_channel};
use crate::transport::{Transport, WebSocketTransport};
use crate::types::{
    ACK_TIMEOUT, DEFAULT_CHANNEL_ADDRESS, KeepaliveError, PROBE_INTERVAL, Result, TICK_INTERVAL,
};
use std::sync::Arc;
use std::time::Duration;

/// Client options. Durations are in milliseconds; `None` means the default.
#[derive(Debug, Clone, Default)]
pub struct KeepaliveOptions {
    /// Base URL relative channel addresses are resolved against
    pub base_url: Option<String>,
    /// Address used when `connect` is called without one
    pub default_address: Option<String>,
    pub tick_interval: Option<u64>,
    pub probe_interval: Option<u64>,
    pub ack_timeout: Option<u64>,
}

/// Validated configuration shared by the client handle and its connection manager
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub resolver: EndpointResolver,
    pub default_address: String,
    pub heartbeat: HeartbeatConfig,
}

impl ClientConfig {
    pub fn from_options(options: &KeepaliveOptions) -> Result<Self> {
        let tick_interval = options.tick_interval.unwrap_or(TICK_INTERVAL);
        if tick_interval == 0 {
            return Err(KeepaliveError::Config(
                "tick interval must be greater than zero".to_string(),
            ));
        }

        let ack_timeout = options.ack_timeout.unwrap_or(ACK_TIMEOUT);
        if ack_timeout == 0 {
            return Err(KeepaliveError::Config(
                "ack timeout must be greater than zero".to_string(),
            ));
        }

        let probe_interval = options.probe_interval.unwrap_or(PROBE_INTERVAL);

        Ok(Self {
            resolver: EndpointResolver::new(options.base_url.as_deref())?,
            default_address: options
                .default_address
                .clone()
                .unwrap_or_else(|| DEFAULT_CHANNEL_ADDRESS.to_string()),
            heartbeat: HeartbeatConfig {
                tick_interval: Duration::from_millis(tick_interval),
                probe_interval: Duration::from_millis(probe_interval),
                ack_timeout: Duration::from_millis(ack_timeout),
            },
        })
    }
}

/// Builder for KeepaliveClient that handles initialization
pub struct KeepaliveClientBuilder {
    config: ClientConfig,
}

impl KeepaliveClientBuilder {
    /// Create a new builder, validating the options
    pub fn new(options: KeepaliveOptions) -> Result<Self> {
        let config = ClientConfig::from_options(&options)?;
        Ok(Self { config })
    }

    /// Build the client over WebSocket connections and spawn its event loop
    pub fn build(self) -> KeepaliveClient {
        self.build_with(WebSocketTransport::new)
    }

    /// Build the client over a custom transport.
    ///
    /// `factory` receives the sender the transport must post its events to.
    pub fn build_with<T, F>(self, factory: F) -> KeepaliveClient
    where
        T: Transport,
        F: FnOnce(EventSender) -> T,
    {
        let (events_tx, events_rx) = event_channel();
        let transport = factory(events_tx.clone());
        let manager = ConnectionManager::new(transport, self.config.clone(), events_tx.clone());
        let state_rx = manager.subscribe();

        let event_loop = tokio::spawn(super::core::run_event_loop(manager, events_rx));

        KeepaliveClient {
            config: self.config,
            events: events_tx.clone(),
            state: state_rx,
            event_loop: Arc::new(EventLoopGuard::new(events_tx, event_loop)),
        }
    }
}
