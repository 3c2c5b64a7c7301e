// WebSocket module - Transport seam and the tungstenite-backed connector
pub mod factory;

#[cfg(test)]
pub(crate) mod mock;

pub use factory::{Connector, Transport, WebSocketFactory, WsSink, WsStream};
