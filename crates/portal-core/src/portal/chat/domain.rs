use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portal::domain::{ChannelId, ChatMessage, MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinChannelRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub user_id: UserId,
    pub text: String,
}

/// Result of a join; joins are idempotent, so callers learn whether the
/// membership row is new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipOutcome {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub newly_joined: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub sender: UserId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl From<&ChatMessage> for MessageView {
    fn from(message: &ChatMessage) -> Self {
        Self {
            message_id: message.id,
            channel_id: message.channel_id,
            sender: message.sender.clone(),
            text: message.text.clone(),
            sent_at: message.sent_at,
        }
    }
}
