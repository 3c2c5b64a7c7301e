// Messaging module - Message kinds and frame routing
pub mod event;
pub mod router;

pub use event::MessageKind;
pub use router::{MessageCallback, MessageRouter, RouteOutcome};
