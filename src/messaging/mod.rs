// Messaging module - Event loop inputs and inbound message routing
pub mod event;
pub mod router;

pub use event::{ConnectionEvent, EventReceiver, EventSender, MessageHandler, event_channel};
pub use router::{MessageRouter, Routed};
