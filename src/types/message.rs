use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::MessageKind;
use crate::types::error::Result;

/// A frame received from the event feed.
///
/// `data` is opaque to the channel and handed to the owner untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl InboundMessage {
    pub fn new(kind: MessageKind, data: serde_json::Value) -> Self {
        Self { kind, data }
    }

    /// Parses a text frame.
    pub fn from_frame(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decodes the payload into a concrete type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// A frame sent to the event feed. Only the heartbeat ping exists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Ping,
}

impl OutboundMessage {
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
