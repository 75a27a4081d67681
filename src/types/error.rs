use thiserror::Error;

/// Errors surfaced by the keepalive client.
///
/// Connection loss is never reported through this type: transport errors and
/// heartbeat timeouts are recovered internally by reconnecting.
#[derive(Error, Debug)]
pub enum KeepaliveError {
    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// URL parsing error (malformed address or base URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The resolved address uses a scheme that has no WebSocket equivalent
    #[error("Unsupported scheme: {0}")]
    InvalidScheme(String),

    /// Invalid client options
    #[error("Configuration error: {0}")]
    Config(String),

    /// Application data equal to the probe token would be swallowed by the keepalive
    #[error("Payload is reserved for heartbeat probes")]
    ReservedPayload,

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,

    /// The client event loop has shut down
    #[error("Client is shut down")]
    Closed,
}

/// Convenience type alias for `Result<T, KeepaliveError>`.
pub type Result<T> = std::result::Result<T, KeepaliveError>;
