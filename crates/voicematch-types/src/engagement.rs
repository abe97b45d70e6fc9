//! Voice messages and their listen counters.

use serde::{Deserialize, Serialize};

use crate::{MessageId, TimestampMs, UserId};

/// Listen counter attached to one message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounter {
    pub listen_count: u64,
}

/// A voice message ("approach") sent from one user to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceMessage {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub recipient_id: UserId,
    pub created_at: TimestampMs,
    pub listen_count: u64,
}

impl VoiceMessage {
    pub fn counter(&self) -> EngagementCounter {
        EngagementCounter {
            listen_count: self.listen_count,
        }
    }
}
