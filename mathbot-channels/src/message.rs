//! Message types exchanged between channels and the dialogue engine.

use crate::session::UserId;
use serde::{Deserialize, Serialize};

/// Channel type enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Telegram,
    Cli,
}

impl ChannelType {
    /// Get the channel type as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Cli => "cli",
        }
    }
}

/// A text message received from a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Message ID (channel-specific or generated)
    pub id: String,
    /// Channel the message came from
    pub channel_type: ChannelType,
    /// Sender
    pub user_id: UserId,
    /// Where replies go (the chat ID; equals the user ID in private chats)
    pub chat_id: String,
    /// Raw message text
    pub text: String,
    /// Whether the channel flagged the text as a bot command
    pub is_command: bool,
    /// Timestamp (Unix millis)
    pub timestamp: i64,
    /// Trace ID for following the message through the logs
    pub trace_id: String,
}

impl InboundEvent {
    /// Build an event with a generated ID, timestamp and trace ID.
    pub fn new(
        channel_type: ChannelType,
        user_id: impl Into<UserId>,
        chat_id: impl Into<String>,
        text: impl Into<String>,
        is_command: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_type,
            user_id: user_id.into(),
            chat_id: chat_id.into(),
            text: text.into(),
            is_command,
            timestamp: now_millis(),
            trace_id: mathbot_common::logging::generate_trace_id(),
        }
    }

    /// Plain text event; command-ness is inferred from a leading `/`.
    pub fn text(channel_type: ChannelType, user_id: impl Into<UserId>, text: &str) -> Self {
        let user_id = user_id.into();
        let chat_id = user_id.to_string();
        Self::new(channel_type, user_id, chat_id, text, text.starts_with('/'))
    }

    /// Wrap an outbound command addressed back to this event's chat.
    pub fn reply(&self, command: OutboundCommand) -> OutgoingMessage {
        OutgoingMessage {
            channel_type: self.channel_type,
            chat_id: self.chat_id.clone(),
            user_id: self.user_id.clone(),
            command,
        }
    }
}

/// What the dialogue engine asks the channel to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    /// Plain text
    SendText { text: String },
    /// Prompt with a single-use reply keyboard
    SendMenu { prompt: String, buttons: Vec<String> },
    /// Image file with a caption
    SendImage { image_path: String, caption: String },
}

impl OutboundCommand {
    pub fn text(text: impl Into<String>) -> Self {
        Self::SendText { text: text.into() }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SendText { .. } => "text",
            Self::SendMenu { .. } => "menu",
            Self::SendImage { .. } => "image",
        }
    }
}

/// Outbound command addressed to a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Target channel type
    pub channel_type: ChannelType,
    /// Target chat ID
    pub chat_id: String,
    /// User the message answers
    pub user_id: UserId,
    /// What to send
    pub command: OutboundCommand,
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
