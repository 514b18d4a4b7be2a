//! Speech dictation capability.
//!
//! Dictation is an optional, injected capability. The composer asks the
//! recognizer whether it is supported before starting, and recognition
//! results come back asynchronously as [`DictationUpdate`]s tagged with the
//! session that produced them.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Locale used when the language code has no mapping.
pub const DEFAULT_LOCALE: &str = "en-US";

/// How long an external transcriber may run for one utterance.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Map a two-letter language code to a recognizer locale tag.
pub fn speech_locale(language: &str) -> &'static str {
    match language.trim().to_ascii_lowercase().as_str() {
        "en" => "en-US",
        "hi" => "hi-IN",
        "te" => "te-IN",
        _ => DEFAULT_LOCALE,
    }
}

/// Parameters for one recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Locale tag, e.g. `hi-IN`.
    pub locale: String,
    /// Whether partial transcripts are reported. Always `false` here.
    pub interim_results: bool,
    /// Number of alternatives requested.
    pub max_alternatives: u32,
    /// Session id echoed on every update of this session.
    pub session: u64,
}

impl RecognitionConfig {
    /// Single-shot configuration for a UI language.
    pub fn for_language(language: &str) -> Self {
        Self {
            locale: speech_locale(language).to_string(),
            interim_results: false,
            max_alternatives: 1,
            session: 0,
        }
    }

    #[must_use]
    pub fn with_session(mut self, session: u64) -> Self {
        self.session = session;
        self
    }
}

/// Lifecycle notifications from a recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    /// The recognizer began listening.
    Started,
    /// A final transcript.
    Transcript(String),
    /// Recognition failed.
    Error(String),
    /// The session finished, with or without a result.
    Ended,
}

/// A [`DictationEvent`] from a particular recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictationUpdate {
    /// Id from the [`RecognitionConfig`] the session was started with.
    pub session: u64,
    pub event: DictationEvent,
}

impl DictationUpdate {
    pub fn new(session: u64, event: DictationEvent) -> Self {
        Self { session, event }
    }
}

/// A speech-to-text capability.
pub trait SpeechRecognizer: Send {
    /// Whether recognition can run in this environment.
    fn is_supported(&self) -> bool;

    /// Begin a single-shot recognition session. Every update it produces
    /// carries `config.session`.
    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError>;

    /// Stop the current session, if any.
    fn stop(&mut self);
}

/// Errors starting recognition.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The capability is not present.
    #[error("Speech recognition is not supported in this environment")]
    Unsupported,

    /// Recognition needs an async runtime to deliver results.
    #[error("No async runtime available for speech recognition")]
    NoRuntime,
}

/// Recognizer for environments without speech input.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _config: &RecognitionConfig) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}
}

/// Recognizer backed by an external transcriber program.
///
/// The program is run once per session; its trimmed stdout is the
/// transcript. `{locale}` in the argument list is replaced with the session
/// locale.
#[derive(Debug)]
pub struct CommandRecognizer {
    argv: Vec<String>,
    events: mpsc::UnboundedSender<DictationUpdate>,
    task: Option<JoinHandle<()>>,
}

impl CommandRecognizer {
    /// Create a recognizer that reports events on `events`.
    pub fn new(argv: Vec<String>, events: mpsc::UnboundedSender<DictationUpdate>) -> Self {
        Self {
            argv,
            events,
            task: None,
        }
    }

    fn build_argv(&self, config: &RecognitionConfig) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| arg.replace("{locale}", &config.locale))
            .collect()
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        self.argv
            .first()
            .is_some_and(|program| which::which(program).is_ok())
    }

    fn start(&mut self, config: &RecognitionConfig) -> Result<(), SpeechError> {
        if !self.is_supported() {
            return Err(SpeechError::Unsupported);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SpeechError::NoRuntime)?;

        self.stop();
        let argv = self.build_argv(config);
        let events = self.events.clone();
        let session = config.session;
        tracing::debug!(locale = %config.locale, session, program = %argv[0], "Starting dictation");

        self.task = Some(runtime.spawn(async move {
            let send = |event| {
                let _ = events.send(DictationUpdate::new(session, event));
            };
            send(DictationEvent::Started);
            match run_transcriber(&argv).await {
                Ok(transcript) if !transcript.is_empty() => {
                    send(DictationEvent::Transcript(transcript));
                }
                Ok(_) => {}
                Err(e) => send(DictationEvent::Error(e)),
            }
            send(DictationEvent::Ended);
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_transcriber(argv: &[String]) -> Result<String, String> {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| format!("spawn failed: {e}"))?;
    match timeout(TRANSCRIBE_TIMEOUT, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        Ok(Ok(output)) => Err(format!(
            "transcriber exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )),
        Ok(Err(e)) => Err(format!("transcriber failed: {e}")),
        Err(_) => Err("transcriber timed out".to_string()),
    }
}
