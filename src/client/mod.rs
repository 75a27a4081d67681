// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{ClientConfig, KeepaliveClientBuilder, KeepaliveOptions};
pub use connection::ConnectionManager;
pub use self::core::KeepaliveClient;
pub use state::{ChannelDescriptor, ConnectionState};
