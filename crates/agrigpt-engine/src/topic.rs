//! Advisory topics.
//!
//! The topic decides which suggestions the welcome view offers and which
//! inference endpoint answers text-only questions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The advisory domain a conversation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Citrus crop health (disease identification, fertilizers, pests).
    #[default]
    CitrusCrop,
    /// Government schemes for farmers.
    GovernmentSchemes,
}

impl Topic {
    /// All topics in menu order.
    pub const ALL: [Topic; 2] = [Topic::CitrusCrop, Topic::GovernmentSchemes];

    /// Human-readable name, as shown in the topic selector.
    pub fn display_name(self) -> &'static str {
        match self {
            Topic::CitrusCrop => "Citrus Crop",
            Topic::GovernmentSchemes => "Government Schemes",
        }
    }

    /// Starter questions offered while a conversation is empty.
    pub fn suggestions(self) -> &'static [&'static str] {
        match self {
            Topic::CitrusCrop => &[
                "Help me identify citrus disease",
                "Best fertilizer for lemon trees",
                "How to control aphids?",
            ],
            Topic::GovernmentSchemes => &[
                "Show schemes for orange farmers",
                "PM-KISAN eligibility",
                "Crop insurance options",
            ],
        }
    }

    /// Placeholder text for the compose box.
    pub fn placeholder(self) -> &'static str {
        match self {
            Topic::CitrusCrop => "Ask or upload photo...",
            Topic::GovernmentSchemes => "Ask about schemes...",
        }
    }

    /// Whether the UI offers photo capture for this topic.
    ///
    /// Attachments sent anyway still go to the image endpoint.
    pub fn offers_photo_capture(self) -> bool {
        matches!(self, Topic::CitrusCrop)
    }

    /// The topic after this one, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Topic::CitrusCrop => Topic::GovernmentSchemes,
            Topic::GovernmentSchemes => Topic::CitrusCrop,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "citrus" | "citrus crop" => Ok(Topic::CitrusCrop),
            "schemes" | "government schemes" => Ok(Topic::GovernmentSchemes),
            _ => Err(UnknownTopic(s.to_string())),
        }
    }
}

/// Returned when a topic name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0} (expected \"citrus\" or \"schemes\")")]
pub struct UnknownTopic(pub String);
