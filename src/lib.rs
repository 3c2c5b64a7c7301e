//! # Food Realtime
//!
//! Client for the food-ordering backend's live event feed: new orders,
//! order status changes and menu updates pushed over a WebSocket.
//!
//! A [`RealtimeChannel`] keeps one socket open, reconnects with exponential
//! backoff when it drops, pings on a fixed interval and forwards every
//! application message to a callback. [`SharedChannel`] lets several
//! independent listeners ride on one socket. [`ApiClient`] covers the REST
//! side with bearer tokens.
//!
//! ## Example
//!
//! ```no_run
//! use food_realtime_rs::{EndpointConfig, MessageKind, RealtimeChannel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = EndpointConfig::from_env()?;
//!
//!     let channel = RealtimeChannel::open_endpoint(&endpoint, Default::default(), |message| {
//!         if message.kind == MessageKind::NewOrder {
//!             println!("new order: {}", message.data);
//!         }
//!     })?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     channel.close().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod endpoint;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use channel::{
    ChannelStatus, ConnectionState, RealtimeChannel, RealtimeChannelBuilder,
    RealtimeChannelOptions, SharedChannel, StatusCallback, Subscription,
};
pub use endpoint::{BuildMode, EndpointConfig};
pub use infrastructure::{ApiClient, TokenProvider};
pub use messaging::{MessageCallback, MessageKind};
pub use types::{InboundMessage, OutboundMessage, RealtimeError, Result};
pub use websocket::{Connector, Transport, WebSocketFactory};
