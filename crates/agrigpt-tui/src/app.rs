//! Application state and key handling for the agrigpt TUI.

use crate::event::Action;
use crate::theme::Theme;
use agrigpt_engine::{
    AttachmentFile, ConversationPage, DictationEvent, DictationUpdate, SidebarLayout,
    SpeechRecognizer, SubmitError, SubmitJob, SubmitOutcome,
};
use std::path::PathBuf;

/// Ticks a notice stays visible (about six seconds at 4 Hz).
const NOTICE_TICKS: usize = 24;

/// Columns taken by the composer border and prompt.
const COMPOSER_CHROME: u16 = 4;

/// What the bottom input line is editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Typing a message.
    #[default]
    Compose,
    /// Typing the path of an image to attach.
    AttachPath(String),
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A transient banner above the composer.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    ttl: usize,
}

/// Application state.
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// The conversation.
    pub page: ConversationPage,

    pub sidebar: SidebarLayout,

    pub theme: Theme,

    pub mode: InputMode,

    pub notice: Option<Notice>,

    /// Transcript lines scrolled up from the bottom.
    pub transcript_scroll: usize,

    /// Tick counter for the busy spinner.
    pub tick: usize,

    /// Two-letter UI language, used for dictation.
    language: String,

    recognizer: Box<dyn SpeechRecognizer>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("should_quit", &self.should_quit)
            .field("show_help", &self.show_help)
            .field("page", &self.page)
            .field("sidebar", &self.sidebar)
            .field("mode", &self.mode)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create a new app instance.
    pub fn new(
        page: ConversationPage,
        recognizer: Box<dyn SpeechRecognizer>,
        language: impl Into<String>,
    ) -> Self {
        let mut app = Self {
            should_quit: false,
            show_help: false,
            page,
            sidebar: SidebarLayout::default(),
            theme: Theme::detect(),
            mode: InputMode::Compose,
            notice: None,
            transcript_scroll: 0,
            tick: 0,
            language: language.into(),
            recognizer,
        };
        if app.page.user_email().is_none() {
            app.error("Not signed in: set user_email in the config or pass --email.");
        }
        app
    }

    /// Show an informational notice.
    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            kind: NoticeKind::Info,
            ttl: NOTICE_TICKS,
        });
    }

    /// Show an error notice.
    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            kind: NoticeKind::Error,
            ttl: NOTICE_TICKS,
        });
    }

    /// Advance animations and expire the notice.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if let Some(notice) = &mut self.notice {
            notice.ttl = notice.ttl.saturating_sub(1);
            if notice.ttl == 0 {
                self.notice = None;
            }
        }
    }

    /// Recompute the composer wrap width for a terminal `width` columns wide.
    pub fn on_resize(&mut self, width: u16) {
        let main = width.saturating_sub(self.sidebar.visible_width(width));
        let wrap = main.saturating_sub(COMPOSER_CHROME);
        self.page.composer_mut().set_wrap_width(usize::from(wrap));
    }

    /// Apply a recognizer notification. Output of a stopped session is
    /// ignored.
    pub fn on_dictation(&mut self, update: DictationUpdate) {
        let failure = match &update.event {
            DictationEvent::Error(message) => Some(format!("Voice input failed: {message}")),
            _ => None,
        };
        if self.page.composer_mut().on_dictation(update) {
            if let Some(text) = failure {
                self.error(text);
            }
        }
    }

    /// Apply a finished submission.
    pub fn finish_submit(&mut self, outcome: SubmitOutcome) {
        if let Err(e) = self.page.complete_submit(outcome) {
            self.error(e.to_string());
        }
    }

    /// Handle an action. Returns a job when a submission should start.
    pub fn handle_action(&mut self, action: Action) -> Option<SubmitJob> {
        if self.show_help {
            // Any key closes help; Ctrl+C still quits.
            self.show_help = false;
            if action == Action::Quit {
                self.should_quit = true;
            }
            return None;
        }

        if let InputMode::AttachPath(path) = &mut self.mode {
            match action {
                Action::Input(c) => path.push(c),
                Action::Backspace => {
                    path.pop();
                }
                Action::Send => {
                    let path = std::mem::take(path);
                    self.mode = InputMode::Compose;
                    self.attach_from_path(&path);
                }
                Action::Back => self.mode = InputMode::Compose,
                Action::Quit => self.should_quit = true,
                _ => {}
            }
            return None;
        }

        match action {
            Action::Quit | Action::Back => self.should_quit = true,
            Action::Help => self.show_help = true,
            Action::Send => {
                if self.page.is_submitting() {
                    self.info("Please wait for the current answer.");
                    return None;
                }
                if !self.page.composer().draft().trim().is_empty() && !self.signed_in() {
                    return None;
                }
                let event = self.page.composer_mut().key_enter(false)?;
                return self.start(|page| page.handle_composer_event(event));
            }
            Action::Newline => {
                self.page.composer_mut().key_enter(true);
            }
            Action::Attach => {
                if self.page.is_submitting() {
                    self.info("Please wait for the current answer.");
                } else {
                    self.mode = InputMode::AttachPath(String::new());
                }
            }
            Action::UsePhoto => {
                if self.page.composer().attachment().is_none() {
                    self.info("No photo attached. Press Ctrl+O to choose one.");
                    return None;
                }
                if self.page.is_submitting() {
                    self.info("Please wait for the current answer.");
                    return None;
                }
                if !self.signed_in() {
                    return None;
                }
                let event = self.page.composer_mut().confirm_attachment()?;
                return self.start(|page| page.handle_composer_event(event));
            }
            Action::Retake => self.page.composer_mut().retake(),
            Action::Dictation => {
                let composer = self.page.composer_mut();
                if let Err(e) = composer.toggle_dictation(self.recognizer.as_mut(), &self.language)
                {
                    tracing::warn!(error = %e, "Dictation unavailable");
                    self.error(e.to_string());
                }
            }
            Action::SwitchTopic => {
                self.stop_dictation();
                let next = self.page.topic().next();
                self.page.switch_topic(next);
                self.transcript_scroll = 0;
                self.info(format!("Switched to {next}"));
            }
            Action::NewChat => {
                self.stop_dictation();
                self.page.start_new_chat();
                self.transcript_scroll = 0;
                self.info("Started a new chat");
            }
            Action::ToggleSidebar => self.sidebar.toggle(),
            Action::WidenSidebar => self.sidebar.widen(),
            Action::ShrinkSidebar => self.sidebar.shrink(),
            Action::ScrollUp => self.transcript_scroll = self.transcript_scroll.saturating_add(1),
            Action::ScrollDown => self.transcript_scroll = self.transcript_scroll.saturating_sub(1),
            Action::Input(c) => {
                if let Some(index) = self.suggestion_shortcut(c) {
                    return self.start(|page| page.submit_suggestion(index));
                }
                self.page.composer_mut().insert_char(c);
            }
            Action::Backspace => self.page.composer_mut().backspace(),
            Action::Delete => self.page.composer_mut().delete(),
            Action::Left => self.page.composer_mut().move_left(),
            Action::Right => self.page.composer_mut().move_right(),
            Action::Home => self.page.composer_mut().move_home(),
            Action::End => self.page.composer_mut().move_end(),
            Action::None => {}
        }
        None
    }

    /// Digits pick a suggestion only on a blank page.
    fn suggestion_shortcut(&self, c: char) -> Option<usize> {
        let composer = self.page.composer();
        if !self.page.messages().is_empty()
            || !composer.draft().is_empty()
            || composer.attachment().is_some()
        {
            return None;
        }
        let digit = c.to_digit(10)? as usize;
        (1..=self.page.suggestions().len())
            .contains(&digit)
            .then(|| digit - 1)
    }

    /// Report a missing sign-in before the composer gives up its draft.
    fn signed_in(&mut self) -> bool {
        if self.page.user_email().is_some() {
            return true;
        }
        self.error(SubmitError::Unauthenticated.to_string());
        false
    }

    fn start(
        &mut self,
        begin: impl FnOnce(
            &mut ConversationPage,
        ) -> Result<SubmitJob, SubmitError>,
    ) -> Option<SubmitJob> {
        match begin(&mut self.page) {
            Ok(job) => {
                self.transcript_scroll = 0;
                self.notice = None;
                Some(job)
            }
            Err(e) => {
                self.error(e.to_string());
                None
            }
        }
    }

    fn attach_from_path(&mut self, raw: &str) {
        let path = expand_path(raw);
        if path.as_os_str().is_empty() {
            return;
        }
        match AttachmentFile::from_path(&path) {
            Ok(file) => {
                let name = file.name.clone();
                self.page.composer_mut().choose_attachment(file);
                self.info(format!(
                    "Attached {name}. Ctrl+U to send, Ctrl+R to retake."
                ));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not attach file");
                self.error(format!("Could not attach {}: {e}", path.display()));
            }
        }
    }

    fn stop_dictation(&mut self) {
        if self.page.composer().is_listening() {
            self.recognizer.stop();
        }
    }
}

/// Trim, unquote (terminals quote dropped paths) and expand a leading `~`.
fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);

    match unquoted.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map_or_else(|| PathBuf::from(unquoted), |home| home.join(rest)),
        None => PathBuf::from(unquoted),
    }
}

#[cfg(test)]
impl App {
    /// App with a signed-in user, no dictation and the default theme.
    pub fn new_for_test() -> Self {
        use agrigpt_engine::{MemoryPreviewStore, StaticIdentity, Topic, UnsupportedRecognizer};
        use std::sync::Arc;

        let page = ConversationPage::new(
            Topic::CitrusCrop,
            Arc::new(StaticIdentity::new(Some("grower@example.com".into()))),
            Arc::new(MemoryPreviewStore::new()),
        );
        let mut app = Self::new(page, Box::new(UnsupportedRecognizer), "en");
        app.theme = Theme::default();
        app
    }

    /// Type a string into the composer.
    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            self.handle_action(Action::Input(c));
        }
    }
}
