use crate::types::constants::message_types;
use serde::{Deserialize, Serialize};

/// Type-safe feed message kinds
///
/// Serialized as the bare wire string so unknown kinds survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// An order was placed
    NewOrder,

    /// An existing order changed status
    OrderUpdate,

    /// Products, prices or availability changed
    MenuUpdate,

    /// Heartbeat request
    Ping,

    /// Heartbeat acknowledgment
    Pong,

    /// Anything the client does not know yet
    Unknown(String),
}

impl MessageKind {
    /// Parse a string into a MessageKind
    pub fn from_str(s: &str) -> Self {
        match s {
            message_types::NEW_ORDER => Self::NewOrder,
            message_types::ORDER_UPDATE => Self::OrderUpdate,
            message_types::MENU_UPDATE => Self::MenuUpdate,
            message_types::PING => Self::Ping,
            message_types::PONG => Self::Pong,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Convert kind to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewOrder => message_types::NEW_ORDER,
            Self::OrderUpdate => message_types::ORDER_UPDATE,
            Self::MenuUpdate => message_types::MENU_UPDATE,
            Self::Ping => message_types::PING,
            Self::Pong => message_types::PONG,
            Self::Unknown(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for MessageKind {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Unknown(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!(MessageKind::from_str("new-order"), MessageKind::NewOrder);
        assert_eq!(MessageKind::from_str("order-update"), MessageKind::OrderUpdate);
        assert_eq!(MessageKind::from_str("menu-update"), MessageKind::MenuUpdate);
        assert_eq!(MessageKind::from_str("pong"), MessageKind::Pong);
        assert_eq!(
            MessageKind::from_str("New-Order"),
            MessageKind::Unknown("New-Order".to_string())
        );
    }

    #[test]
    fn test_known_kinds_round_trip() {
        let kinds = vec![
            MessageKind::NewOrder,
            MessageKind::OrderUpdate,
            MessageKind::MenuUpdate,
            MessageKind::Ping,
            MessageKind::Pong,
        ];

        for kind in kinds {
            assert!(kind.is_known());
            assert_eq!(MessageKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_message_kind_serializes_as_plain_string() {
        let json = serde_json::to_string(&MessageKind::MenuUpdate).unwrap();
        assert_eq!(json, r#""menu-update""#);

        let kind: MessageKind = serde_json::from_str(r#""table-ready""#).unwrap();
        assert_eq!(kind, MessageKind::Unknown("table-ready".to_string()));
        assert!(!kind.is_known());
        assert_eq!(kind.to_string(), "table-ready");
    }
}
