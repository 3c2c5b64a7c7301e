// Module declarations
mod builder;
mod connection;
mod core;
mod shared;
mod state;

// Public API exports
pub use builder::{RealtimeChannelBuilder, RealtimeChannelOptions};
pub use connection::{ConnectionManager, ConnectionState};
pub use core::RealtimeChannel;
pub use shared::{SharedChannel, Subscription};
pub use state::{ChannelState, ChannelStatus, StatusCallback, StatusNotifier};
