/// Feed message type strings (wire vocabulary)
pub mod message_types {
    pub const NEW_ORDER: &str = "new-order";
    pub const ORDER_UPDATE: &str = "order-update";
    pub const MENU_UPDATE: &str = "menu-update";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
}

/// Path of the event feed on the backend
pub const SOCKET_PATH: &str = "socket.io/";

/// Path prefix the production deployment is mounted under
pub const DEFAULT_APP_PREFIX: &str = "food-ordering-system";

/// Development backend defaults
pub const DEFAULT_BACKEND_HOST: &str = "localhost";
pub const DEFAULT_BACKEND_PORT: u16 = 8000;

/// Default reconnect delays (milliseconds)
pub const INITIAL_RECONNECT_DELAY: u64 = 1000;
pub const MAX_RECONNECT_DELAY: u64 = 30000;

/// Scheduled reconnects before giving up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Default jitter applied to each scheduled reconnect (fraction of the delay)
pub const RECONNECT_JITTER: f64 = 0.2;

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 30000;

/// Default readiness poll interval (milliseconds)
pub const LIVENESS_INTERVAL: u64 = 5000;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
