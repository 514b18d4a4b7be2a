//! agrigpt-engine: Headless core of the agrigpt crop advisory client
//!
//! This crate holds everything that does not touch the terminal:
//! - Configuration loading and environment overrides
//! - The conversation page and its submission pipeline
//! - The compose box (draft, attachment, dictation)
//! - The advisory backend client
//! - Identity, speech and preview-store capabilities

pub mod attachment;
pub mod backend;
pub mod composer;
pub mod config;
pub mod identity;
pub mod layout;
pub mod message;
pub mod page;
pub mod speech;
pub mod topic;

// Re-export commonly used types
pub use attachment::{
    AttachmentError, AttachmentFile, MemoryPreviewStore, PendingAttachment, PreviewError,
    PreviewHandle, PreviewStore,
};
pub use backend::{
    Backend, BackendError, Endpoint, HttpBackend, InferenceRequest, InferenceResponse,
    SaveMessageRequest, SaveMessageResponse, FALLBACK_REPLY,
};
pub use composer::{Composer, ComposerError, ComposerEvent, MAX_INPUT_ROWS};
pub use config::{Config, ConfigError};
pub use identity::{IdentityProvider, StaticIdentity};
pub use layout::SidebarLayout;
pub use message::{Message, MessageSource};
pub use page::{
    ConversationPage, PageStatus, SubmitError, SubmitJob, SubmitOutcome, DEFAULT_IMAGE_PROMPT,
};
pub use speech::{
    speech_locale, CommandRecognizer, DictationEvent, DictationUpdate, RecognitionConfig,
    SpeechError, SpeechRecognizer, UnsupportedRecognizer,
};
pub use topic::{Topic, UnknownTopic};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
