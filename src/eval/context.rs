use serde::{Deserialize, Serialize};

/// Chat identifiers ending in this suffix name group conversations.
pub const GROUP_SUFFIX: &str = "@g.us";

/// The addressing part of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Envelope {
    /// The conversation the message arrived in.
    pub chat_id: String,
    /// The group-scoped sender. Present iff the message came from a group.
    #[serde(default)]
    pub participant_id: Option<String>,
}

impl Envelope {
    /// A message in a direct chat.
    pub fn direct(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            participant_id: None,
        }
    }

    /// A message sent by `participant_id` inside group `chat_id`.
    pub fn group(chat_id: impl Into<String>, participant_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            participant_id: Some(participant_id.into()),
        }
    }

    /// Canonical sender: the local part of the participant id if present,
    /// otherwise of the chat id.
    pub fn sender(&self) -> &str {
        let id = self.participant_id.as_deref().unwrap_or(&self.chat_id);
        local_part(id)
    }

    pub fn is_group(&self) -> bool {
        is_group(&self.chat_id)
    }
}

/// Whether `chat_id` names a group conversation.
pub fn is_group(chat_id: &str) -> bool {
    chat_id.ends_with(GROUP_SUFFIX)
}

/// The segment before the first `@` (the whole id when there is none).
pub fn local_part(id: &str) -> &str {
    id.split('@').next().unwrap_or(id)
}
