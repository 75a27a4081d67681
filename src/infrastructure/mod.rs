// Infrastructure module - Heartbeat, endpoint resolution and task tracking
pub mod endpoint;
pub mod heartbeat;
pub mod task_manager;

pub use endpoint::{EndpointResolver, http_to_ws_endpoint};
pub use heartbeat::{HeartbeatClock, HeartbeatConfig, HeartbeatTimer, TickAction};
pub use task_manager::TaskManager;
