use super::MessageKind;
use crate::types::message::InboundMessage;
use std::sync::Arc;

/// Owner callback invoked once per forwarded message
pub type MessageCallback = Arc<dyn Fn(InboundMessage) + Send + Sync + 'static>;

/// What the router did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the owner callback
    Forwarded,
    /// Heartbeat acknowledgment, consumed internally
    Pong,
    /// Could not be decoded
    Discarded,
}

/// Decodes text frames and hands application messages to the owner
pub struct MessageRouter {
    on_message: MessageCallback,
}

impl MessageRouter {
    pub fn new(on_message: MessageCallback) -> Self {
        Self { on_message }
    }

    /// Routes a raw text frame. A bad frame is logged and dropped.
    pub fn route_text(&self, text: &str) -> RouteOutcome {
        match InboundMessage::from_frame(text) {
            Ok(message) => self.route(message),
            Err(e) => {
                tracing::warn!("Discarding malformed frame: {} - Raw: {}", e, text);
                RouteOutcome::Discarded
            }
        }
    }

    /// Routes a decoded message to the owner callback
    pub fn route(&self, message: InboundMessage) -> RouteOutcome {
        match &message.kind {
            MessageKind::Pong => {
                tracing::debug!("Received pong from server");
                return RouteOutcome::Pong;
            }
            MessageKind::Unknown(kind) => {
                tracing::warn!("Forwarding unrecognized message type: {}", kind);
            }
            kind => {
                tracing::debug!(
                    "Forwarding message: type={}, data={}",
                    kind,
                    serde_json::to_string(&message.data).unwrap_or_default()
                );
            }
        }

        (self.on_message)(message);
        RouteOutcome::Forwarded
    }
}
