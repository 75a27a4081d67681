//! # ws-keepalive
//!
//! Client-side keepalive and reconnect manager for a persistent WebSocket
//! channel.
//!
//! The client keeps a single logical channel open. It probes the peer with
//! the one-character `"!"` token, expects the same token back, and when a
//! transport error or an unanswered probe reveals that the link died, it
//! reconnects to the same address with the same message handler. Probe
//! acknowledgments never reach the handler; every other payload is passed
//! through verbatim.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ws_keepalive::{KeepaliveClient, KeepaliveOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KeepaliveClient::new(KeepaliveOptions {
//!         base_url: Some("http://localhost:3000".to_string()),
//!         ..Default::default()
//!     })?;
//!
//!     client.connect(None, Some(Arc::new(|text: String| println!("{}", text))))?;
//!     tokio::signal::ctrl_c().await?;
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod transport;
pub mod types;

pub use client::{ConnectionState, KeepaliveClient, KeepaliveClientBuilder, KeepaliveOptions};
pub use infrastructure::HeartbeatConfig;
pub use messaging::MessageHandler;
pub use transport::{ConnectionId, Transport, TransportEvent, WebSocketTransport};
pub use types::{KeepaliveError, Result};
