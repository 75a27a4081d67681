/// Reserved in-band token used both as heartbeat probe and as its acknowledgment
pub const PROBE_TOKEN: &str = "!";

/// Channel address used when `connect` is called without one
pub const DEFAULT_CHANNEL_ADDRESS: &str = "/ws/common";

/// Heartbeat tick interval (milliseconds)
pub const TICK_INTERVAL: u64 = 5000;

/// Minimum time between two probes (milliseconds)
pub const PROBE_INTERVAL: u64 = 6000;

/// Grace period for a probe acknowledgment (milliseconds)
pub const ACK_TIMEOUT: u64 = 1000;

/// URL schemes
pub mod schemes {
    pub const HTTP: &str = "http";
    pub const HTTPS: &str = "https";
    pub const WS: &str = "ws";
    pub const WSS: &str = "wss";
}
