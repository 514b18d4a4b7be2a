//! agrigpt-tui: terminal client for the AgriGPT advisory chat.
//!
//! This crate provides the interactive layer on top of `agrigpt-engine`:
//! - Chat screen with topic sidebar, transcript and composer
//! - Photo attachment and voice dictation controls
//! - Markdown rendering of advisor replies

mod app;
mod event;
mod screen;
mod text;
mod theme;
mod widgets;

pub use agrigpt_engine;
pub use app::{App, InputMode, Notice, NoticeKind};
pub use event::{Action, Event, EventHandler};
pub use theme::Theme;

use agrigpt_engine::{
    Backend, CommandRecognizer, Config, ConversationPage, DictationUpdate, HttpBackend,
    MemoryPreviewStore, SpeechRecognizer, StaticIdentity, SubmitJob, SubmitOutcome,
    UnsupportedRecognizer,
};
use crossterm::{
    cursor::Show as ShowCursor,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the TUI application.
///
/// Builds the backend, identity and recognizer from `config`, sets up the
/// terminal, runs the event loop and restores the terminal on exit.
pub async fn run_tui(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config)?);

    let (dictation_tx, mut dictation_rx) = mpsc::unbounded_channel();
    let recognizer: Box<dyn SpeechRecognizer> = match &config.speech_command {
        Some(argv) if !argv.is_empty() => {
            Box::new(CommandRecognizer::new(argv.clone(), dictation_tx))
        }
        _ => Box::new(UnsupportedRecognizer),
    };

    let page = ConversationPage::new(
        config.default_topic,
        Arc::new(StaticIdentity::new(config.user_email.clone())),
        Arc::new(MemoryPreviewStore::new()),
    );
    let mut app = App::new(page, recognizer, config.language.clone());
    tracing::info!(
        backend = config.base_url(),
        topic = %config.default_topic,
        "Starting TUI"
    );

    // Setup terminal with RAII guard for cleanup
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // 4 Hz tick rate = 250ms
    let mut events = EventHandler::new(250);

    let result = run_loop(
        &mut terminal,
        &mut app,
        &mut events,
        &mut dictation_rx,
        &backend,
    )
    .await;

    terminal.show_cursor()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    dictation: &mut mpsc::UnboundedReceiver<DictationUpdate>,
    backend: &Arc<dyn Backend>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut submission: Option<JoinHandle<SubmitOutcome>> = None;

    loop {
        app.on_resize(terminal.size()?.width);
        terminal.draw(|frame| {
            let area = frame.area();
            screen::render(app, area, frame.buffer_mut());
        })?;

        while let Ok(update) = dictation.try_recv() {
            app.on_dictation(update);
        }

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    let action = event::key_to_action(key);
                    if let Some(job) = app.handle_action(action) {
                        submission = Some(spawn_submission(job, backend));
                    }
                }
                Event::Tick => app.tick(),
                Event::Resize(width, _) => app.on_resize(width),
            }
        }

        if submission.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = submission.take() {
                match handle.await {
                    Ok(outcome) => app.finish_submit(outcome),
                    Err(e) => {
                        tracing::error!(error = %e, "Submission task failed");
                        app.error(format!("Request failed: {e}"));
                    }
                }
            }
        }

        if app.should_quit {
            if let Some(handle) = submission {
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

fn spawn_submission(job: SubmitJob, backend: &Arc<dyn Backend>) -> JoinHandle<SubmitOutcome> {
    let backend = Arc::clone(backend);
    tokio::spawn(async move { job.run(backend.as_ref()).await })
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tui_version() {
        let version = tui_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
