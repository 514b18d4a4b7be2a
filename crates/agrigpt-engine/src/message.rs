//! Conversation messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a message. Serialized the way the message store expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    /// Typed, dictated or uploaded by the user.
    User,
    /// Answer from the advisory backend.
    System,
}

impl MessageSource {
    /// Wire name (`"user"` / `"system"`).
    pub fn as_str(self) -> &'static str {
        match self {
            MessageSource::User => "user",
            MessageSource::System => "system",
        }
    }
}

/// A single entry in the visible conversation history.
///
/// Messages are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub source: MessageSource,
    /// Message text. May be empty for an image sent without a caption.
    pub text: String,
    /// Renderable image (data URL) attached by the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// When the message was created locally.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message, optionally carrying an image preview.
    pub fn user(text: impl Into<String>, image: Option<String>) -> Self {
        Self {
            source: MessageSource::User,
            text: text.into(),
            image,
            timestamp: Utc::now(),
        }
    }

    /// Create a message for a backend reply.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            source: MessageSource::System,
            text: text.into(),
            image: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether this message was authored by the user.
    pub fn is_user(&self) -> bool {
        self.source == MessageSource::User
    }
}
