use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

/// Lifecycle of an fcm_messages document. Written exactly once by the
/// dispatcher; absent on freshly created documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(MessageStatus::Pending),
            "sent" => Some(MessageStatus::Sent),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }

    /// A processed message is never dispatched again.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Failed)
    }
}

impl Display for MessageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Failed => write!(f, "failed"),
        }
    }
}
