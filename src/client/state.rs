use crate::messaging::MessageHandler;
use std::fmt;

/// Lifecycle of the single managed connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    /// Whether a transport connection is tracked in this state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

/// The last channel the caller connected to.
///
/// Kept across disconnects so connection-loss recovery reopens the same
/// address with the same handler. Only an explicit `connect` replaces it.
#[derive(Clone)]
pub struct ChannelDescriptor {
    pub address: String,
    pub handler: Option<MessageHandler>,
}

impl ChannelDescriptor {
    pub fn new(address: impl Into<String>, handler: Option<MessageHandler>) -> Self {
        Self {
            address: address.into(),
            handler,
        }
    }
}

impl fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("address", &self.address)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(!ConnectionState::Disconnected.is_active());
        assert!(ConnectionState::Connecting.is_active());
        assert!(ConnectionState::Open.is_active());
        assert!(!ConnectionState::Closing.is_active());
    }
}
