//! The compose box.
//!
//! The composer owns the draft text, at most one pending image attachment and
//! the dictation state. It knows nothing about the conversation: its only
//! output is a [`ComposerEvent`] returned from the operations that send.

use crate::attachment::{AttachmentFile, PendingAttachment, PreviewStore};
use crate::speech::{
    DictationEvent, DictationUpdate, RecognitionConfig, SpeechError, SpeechRecognizer,
};
use std::fmt;
use std::sync::Arc;

/// Maximum height of the input area, in rows. The draft scrolls beyond this.
pub const MAX_INPUT_ROWS: u16 = 5;

/// Outbound events from the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerEvent {
    /// Send the (trimmed) draft as a text question.
    SendText(String),
    /// Send an image, with the trimmed draft as an optional caption.
    SendImage {
        file: AttachmentFile,
        caption: Option<String>,
    },
}

/// Errors surfaced by composer operations.
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    /// Dictation was requested but no recognizer is available.
    #[error("Voice input is not supported here")]
    SpeechUnsupported,

    /// The recognizer refused to start.
    #[error("Voice input failed: {0}")]
    Speech(#[from] SpeechError),
}

/// Compose box state.
pub struct Composer {
    draft: String,
    /// Cursor position as a character index into `draft`.
    cursor: usize,
    rows: u16,
    wrap_width: usize,
    attachment: Option<PendingAttachment>,
    previews: Arc<dyn PreviewStore>,
    listening: bool,
    /// Bumped on every start and stop so stale recognizer output is ignored.
    dictation_session: u64,
    disabled: bool,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("draft", &self.draft)
            .field("cursor", &self.cursor)
            .field("rows", &self.rows)
            .field("attachment", &self.attachment)
            .field("listening", &self.listening)
            .field("dictation_session", &self.dictation_session)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Composer {
    /// Create an empty composer that takes preview handles from `previews`.
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            draft: String::new(),
            cursor: 0,
            rows: 1,
            wrap_width: 0,
            attachment: None,
            previews,
            listening: false,
            dictation_session: 0,
            disabled: false,
        }
    }

    // === Draft ===

    /// Current draft text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Cursor position (character index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current height of the input area in rows.
    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Replace the draft and auto-grow the input area.
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.draft = value.into();
        self.cursor = self.draft.chars().count();
        self.auto_grow();
    }

    /// Set the width used to count soft-wrapped rows (0 disables wrapping).
    pub fn set_wrap_width(&mut self, width: usize) {
        self.wrap_width = width;
        self.auto_grow();
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.draft.insert(at, ch);
        self.cursor += 1;
        self.auto_grow();
    }

    /// Insert a string at the cursor.
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_index(self.cursor);
        self.draft.insert_str(at, s);
        self.cursor += s.chars().count();
        self.auto_grow();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.draft.remove(at);
            self.auto_grow();
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.draft.chars().count() {
            let at = self.byte_index(self.cursor);
            self.draft.remove(at);
            self.auto_grow();
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.draft.chars().count() {
            self.cursor += 1;
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.draft.chars().count();
    }

    /// Enter sends the draft; Shift+Enter inserts a newline instead.
    pub fn key_enter(&mut self, shift: bool) -> Option<ComposerEvent> {
        if shift {
            self.insert_char('\n');
            None
        } else {
            self.submit_text()
        }
    }

    /// Emit the trimmed draft as [`ComposerEvent::SendText`] and clear it.
    ///
    /// Does nothing when the trimmed draft is empty or the composer is
    /// disabled.
    pub fn submit_text(&mut self) -> Option<ComposerEvent> {
        let text = self.draft.trim();
        if text.is_empty() || self.disabled {
            return None;
        }
        let event = ComposerEvent::SendText(text.to_string());
        self.clear_draft();
        Some(event)
    }

    fn clear_draft(&mut self) {
        self.draft.clear();
        self.cursor = 0;
        self.rows = 1;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.draft
            .char_indices()
            .nth(char_index)
            .map_or(self.draft.len(), |(i, _)| i)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn auto_grow(&mut self) {
        if self.draft.is_empty() {
            self.rows = 1;
            return;
        }
        let rows: usize = self
            .draft
            .split('\n')
            .map(|line| {
                let len = line.chars().count();
                if self.wrap_width == 0 || len == 0 {
                    1
                } else {
                    len.div_ceil(self.wrap_width)
                }
            })
            .sum();
        self.rows = rows.clamp(1, usize::from(MAX_INPUT_ROWS)) as u16;
    }

    // === Attachment ===

    /// The pending attachment, if any.
    pub fn attachment(&self) -> Option<&PendingAttachment> {
        self.attachment.as_ref()
    }

    /// Stage a file, releasing the preview of any previously staged one.
    pub fn choose_attachment(&mut self, file: AttachmentFile) {
        self.release_attachment();
        let preview = self.previews.create(&file);
        tracing::debug!(name = %file.name, bytes = file.len(), "Attachment staged");
        self.attachment = Some(PendingAttachment { preview, file });
    }

    /// Discard the pending attachment.
    pub fn retake(&mut self) {
        self.release_attachment();
    }

    /// Emit the pending attachment as [`ComposerEvent::SendImage`].
    ///
    /// The trimmed draft becomes the caption when non-empty. Clears the draft
    /// and the attachment. Does nothing without an attachment or while
    /// disabled.
    pub fn confirm_attachment(&mut self) -> Option<ComposerEvent> {
        if self.disabled {
            return None;
        }
        let pending = self.attachment.take()?;
        let caption = Some(self.draft.trim().to_string()).filter(|c| !c.is_empty());
        let PendingAttachment { preview, file } = pending;
        if let Err(e) = self.previews.release(preview) {
            tracing::warn!(error = %e, "Failed to release attachment preview");
        }
        self.clear_draft();
        Some(ComposerEvent::SendImage { file, caption })
    }

    fn release_attachment(&mut self) {
        if let Some(pending) = self.attachment.take() {
            if let Err(e) = self.previews.release(pending.preview) {
                tracing::warn!(error = %e, "Failed to release attachment preview");
            }
        }
    }

    // === Dictation ===

    /// Whether a dictation session is active.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Start or stop dictation.
    ///
    /// Starting needs a supported recognizer; otherwise
    /// [`ComposerError::SpeechUnsupported`] is returned and nothing changes.
    pub fn toggle_dictation(
        &mut self,
        recognizer: &mut dyn SpeechRecognizer,
        language: &str,
    ) -> Result<(), ComposerError> {
        if self.listening {
            recognizer.stop();
            self.end_dictation_session();
            return Ok(());
        }
        if self.disabled {
            return Ok(());
        }
        if !recognizer.is_supported() {
            return Err(ComposerError::SpeechUnsupported);
        }

        let session = self.dictation_session + 1;
        recognizer.start(&RecognitionConfig::for_language(language).with_session(session))?;
        self.dictation_session = session;
        self.listening = true;
        Ok(())
    }

    /// Id of the newest dictation session. Updates tagged with anything else
    /// are ignored.
    pub fn dictation_session(&self) -> u64 {
        self.dictation_session
    }

    /// Stop listening and ignore anything the old session still reports.
    fn end_dictation_session(&mut self) {
        self.listening = false;
        self.dictation_session += 1;
    }

    /// Apply a notification from the recognizer.
    ///
    /// Returns `false` when the update came from a stopped session and was
    /// dropped.
    pub fn on_dictation(&mut self, update: DictationUpdate) -> bool {
        if update.session != self.dictation_session {
            tracing::debug!(
                session = update.session,
                current = self.dictation_session,
                "Dropping dictation update from a stopped session"
            );
            return false;
        }
        match update.event {
            DictationEvent::Started => self.listening = true,
            DictationEvent::Transcript(transcript) => {
                let text = if self.draft.is_empty() {
                    transcript
                } else {
                    format!("{} {transcript}", self.draft)
                };
                self.set_text(text);
            }
            DictationEvent::Error(error) => {
                tracing::warn!(%error, "Dictation failed");
                self.listening = false;
            }
            DictationEvent::Ended => self.listening = false,
        }
        true
    }

    // === Lifecycle ===

    /// Whether sending is currently blocked.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Block or allow sending.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Clear the draft and attachment and forget dictation state.
    pub fn reset(&mut self) {
        self.clear_draft();
        self.release_attachment();
        self.end_dictation_session();
    }
}

impl Drop for Composer {
    fn drop(&mut self) {
        self.release_attachment();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::MemoryPreviewStore;

    fn composer() -> (Composer, Arc<MemoryPreviewStore>) {
        let store = Arc::new(MemoryPreviewStore::new());
        (Composer::new(store.clone()), store)
    }

    /// Tag `event` with the composer's current session.
    fn current(composer: &Composer, event: DictationEvent) -> DictationUpdate {
        DictationUpdate::new(composer.dictation_session(), event)
    }

    fn leaf() -> AttachmentFile {
        AttachmentFile::new("leaf.jpg", "image/jpeg", vec![0xFF, 0xD8])
    }

    /// Recognizer fake with a fixed capability answer.
    #[derive(Default)]
    struct FakeRecognizer {
        supported: bool,
        started: Vec<RecognitionConfig>,
        stopped: usize,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
            self.started.push(config.clone());
            Ok(())
        }

        fn stop(&mut self) {
            self.stopped += 1;
        }
    }

    #[test]
    fn test_submit_text_trims_and_clears() {
        let (mut composer, _) = composer();
        composer.set_text("  how to control aphids?  ");

        let event = composer.submit_text();
        assert_eq!(
            event,
            Some(ComposerEvent::SendText("how to control aphids?".into()))
        );
        assert_eq!(composer.draft(), "");
        assert_eq!(composer.rows(), 1);
    }

    #[test]
    fn test_submit_text_noop_when_blank_or_disabled() {
        let (mut composer, _) = composer();
        composer.set_text("   \n ");
        assert_eq!(composer.submit_text(), None);
        assert_eq!(composer.draft(), "   \n ");

        composer.set_text("hello");
        composer.set_disabled(true);
        assert_eq!(composer.submit_text(), None);
        assert_eq!(composer.draft(), "hello");
    }

    #[test]
    fn test_enter_and_shift_enter() {
        let (mut composer, _) = composer();
        composer.insert_str("line one");
        assert_eq!(composer.key_enter(true), None);
        composer.insert_str("line two");
        assert_eq!(composer.draft(), "line one\nline two");

        assert_eq!(
            composer.key_enter(false),
            Some(ComposerEvent::SendText("line one\nline two".into()))
        );
    }

    #[test]
    fn test_auto_grow_caps_and_resets() {
        let (mut composer, _) = composer();
        assert_eq!(composer.rows(), 1);

        composer.set_text("a\nb\nc");
        assert_eq!(composer.rows(), 3);

        composer.set_text("1\n2\n3\n4\n5\n6\n7\n8");
        assert_eq!(composer.rows(), MAX_INPUT_ROWS);

        composer.set_text("");
        assert_eq!(composer.rows(), 1);
    }

    #[test]
    fn test_auto_grow_counts_soft_wraps() {
        let (mut composer, _) = composer();
        composer.set_wrap_width(10);
        composer.set_text("x".repeat(25));
        assert_eq!(composer.rows(), 3);
    }

    #[test]
    fn test_cursor_editing_is_char_aware() {
        let (mut composer, _) = composer();
        composer.insert_str("నీరు");
        composer.move_left();
        composer.insert_char('X');
        assert_eq!(composer.draft(), "నీరXు");

        composer.move_home();
        composer.delete();
        composer.move_end();
        composer.backspace();
        assert_eq!(composer.draft(), "ీరX");
    }

    #[test]
    fn test_choose_attachment_replaces_and_releases_previous() {
        let (mut composer, store) = composer();
        composer.choose_attachment(leaf());
        let first = composer.attachment().unwrap().preview.as_str().to_string();

        composer.choose_attachment(AttachmentFile::new("fruit.png", "image/png", vec![1]));
        assert!(!store.is_live(&first));
        assert_eq!(store.released_count(), 1);
        assert_eq!(store.live_count(), 1);
        assert_eq!(composer.attachment().unwrap().file.name, "fruit.png");
    }

    #[test]
    fn test_retake_releases_once() {
        let (mut composer, store) = composer();
        composer.choose_attachment(leaf());
        composer.retake();
        composer.retake();
        assert!(composer.attachment().is_none());
        assert_eq!(store.released_count(), 1);
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_confirm_attachment_with_caption() {
        let (mut composer, store) = composer();
        composer.choose_attachment(leaf());
        composer.set_text("  brown spots  ");

        let event = composer.confirm_attachment();
        assert_eq!(
            event,
            Some(ComposerEvent::SendImage {
                file: leaf(),
                caption: Some("brown spots".into()),
            })
        );
        assert_eq!(composer.draft(), "");
        assert!(composer.attachment().is_none());
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn test_confirm_attachment_without_caption() {
        let (mut composer, _) = composer();
        composer.choose_attachment(leaf());
        composer.set_text("   ");
        assert_eq!(
            composer.confirm_attachment(),
            Some(ComposerEvent::SendImage {
                file: leaf(),
                caption: None,
            })
        );
    }

    #[test]
    fn test_confirm_attachment_noop_cases() {
        let (mut composer, store) = composer();
        assert_eq!(composer.confirm_attachment(), None);

        composer.choose_attachment(leaf());
        composer.set_disabled(true);
        assert_eq!(composer.confirm_attachment(), None);
        assert!(composer.attachment().is_some());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_drop_releases_pending_attachment() {
        let (mut composer, store) = composer();
        composer.choose_attachment(leaf());
        drop(composer);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut composer, store) = composer();
        composer.set_text("draft");
        composer.choose_attachment(leaf());
        composer.on_dictation(current(&composer, DictationEvent::Started));

        composer.reset();
        assert_eq!(composer.draft(), "");
        assert!(composer.attachment().is_none());
        assert!(!composer.is_listening());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_dictation_unsupported_leaves_draft() {
        let (mut composer, _) = composer();
        composer.set_text("keep me");
        let mut recognizer = FakeRecognizer::default();

        let err = composer.toggle_dictation(&mut recognizer, "en").unwrap_err();
        assert!(matches!(err, ComposerError::SpeechUnsupported));
        assert_eq!(composer.draft(), "keep me");
        assert!(!composer.is_listening());
        assert!(recognizer.started.is_empty());
    }

    #[test]
    fn test_dictation_start_uses_mapped_locale() {
        let (mut composer, _) = composer();
        let mut recognizer = FakeRecognizer {
            supported: true,
            ..FakeRecognizer::default()
        };

        composer.toggle_dictation(&mut recognizer, "hi").unwrap();
        assert!(composer.is_listening());
        assert_eq!(recognizer.started[0].locale, "hi-IN");
        assert!(!recognizer.started[0].interim_results);
        assert_eq!(recognizer.started[0].session, composer.dictation_session());

        composer.toggle_dictation(&mut recognizer, "hi").unwrap();
        assert!(!composer.is_listening());
        assert_eq!(recognizer.stopped, 1);
    }

    #[test]
    fn test_stopped_session_output_is_dropped() {
        let (mut composer, _) = composer();
        let mut recognizer = FakeRecognizer {
            supported: true,
            ..FakeRecognizer::default()
        };
        composer.toggle_dictation(&mut recognizer, "en").unwrap();
        let old = recognizer.started[0].session;

        composer.toggle_dictation(&mut recognizer, "en").unwrap();
        assert!(!composer.on_dictation(DictationUpdate::new(old, DictationEvent::Started)));
        assert!(!composer.on_dictation(DictationUpdate::new(
            old,
            DictationEvent::Transcript("late words".into())
        )));
        assert_eq!(composer.draft(), "");
        assert!(!composer.is_listening());

        // A new session gets a fresh id and is heard again.
        composer.toggle_dictation(&mut recognizer, "en").unwrap();
        let new = recognizer.started[1].session;
        assert_ne!(new, old);
        assert!(composer.on_dictation(DictationUpdate::new(
            new,
            DictationEvent::Transcript("fresh words".into())
        )));
        assert_eq!(composer.draft(), "fresh words");
    }

    #[test]
    fn test_reset_drops_queued_dictation() {
        let (mut composer, _) = composer();
        let mut recognizer = FakeRecognizer {
            supported: true,
            ..FakeRecognizer::default()
        };
        composer.toggle_dictation(&mut recognizer, "en").unwrap();
        let session = composer.dictation_session();

        composer.reset();
        composer.on_dictation(DictationUpdate::new(session, DictationEvent::Started));
        composer.on_dictation(DictationUpdate::new(
            session,
            DictationEvent::Transcript("old words".into()),
        ));
        assert_eq!(composer.draft(), "");
        assert!(!composer.is_listening());
    }

    #[test]
    fn test_dictation_transcript_appends() {
        let (mut composer, _) = composer();
        composer.on_dictation(current(&composer, DictationEvent::Transcript("leaves curling".into())));
        assert_eq!(composer.draft(), "leaves curling");

        composer.on_dictation(current(&composer, DictationEvent::Transcript("after rain".into())));
        assert_eq!(composer.draft(), "leaves curling after rain");
        assert_eq!(composer.cursor(), composer.draft().chars().count());
    }

    #[test]
    fn test_dictation_error_and_end_go_inactive() {
        let (mut composer, _) = composer();
        composer.on_dictation(current(&composer, DictationEvent::Started));
        composer.on_dictation(current(&composer, DictationEvent::Error("no-speech".into())));
        assert!(!composer.is_listening());

        composer.on_dictation(current(&composer, DictationEvent::Started));
        composer.on_dictation(current(&composer, DictationEvent::Ended));
        assert!(!composer.is_listening());
    }
}
