use super::MessageHandler;
use crate::types::constants::PROBE_TOKEN;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// What happened to an inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Heartbeat acknowledgment, consumed by the keepalive
    ProbeAck,
    /// Passed to the registered handler
    Delivered,
    /// The registered handler panicked while processing the payload
    HandlerPanicked,
    /// No handler registered, payload was logged
    Unhandled,
}

/// Routes incoming payloads either to the heartbeat or to the application handler
#[derive(Clone, Default)]
pub struct MessageRouter {
    handler: Option<MessageHandler>,
}

impl MessageRouter {
    pub fn new(handler: Option<MessageHandler>) -> Self {
        Self { handler }
    }

    /// Checks if a payload is a heartbeat acknowledgment
    pub fn is_probe_ack(payload: &str) -> bool {
        payload == PROBE_TOKEN
    }

    /// Routes a payload to the appropriate sink.
    ///
    /// A panicking handler is contained here so the event loop keeps running.
    pub fn route(&self, payload: String) -> Routed {
        if Self::is_probe_ack(&payload) {
            tracing::debug!("Received heartbeat ack");
            return Routed::ProbeAck;
        }

        match &self.handler {
            Some(handler) => match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(()) => Routed::Delivered,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!("Message handler panicked: {}", reason);
                    Routed::HandlerPanicked
                }
            },
            None => {
                tracing::info!("Message received: {}", payload);
                Routed::Unhandled
            }
        }
    }
}
