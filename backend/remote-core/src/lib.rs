pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod router;


pub const DEFAULT_SERVER_ADDRESS: &str = "localhost:8080";
pub const WEBSOCKET_SCHEME: &str = "ws://";
pub const DEFAULT_SERVER_URL: &str =
    const_format::concatcp!(WEBSOCKET_SCHEME, DEFAULT_SERVER_ADDRESS);

/// Keepalive and reconnect cadence.
pub const KEEPALIVE_INTERVAL_MS: u64 = 2000;

/// Bare string sent on every keepalive tick.
pub const KEEPALIVE_PAYLOAD: &str = "ping";
