//! The conversation page.
//!
//! Owns the visible history, the active topic, the backend chat id and the
//! composer. A submission is split into three steps so a UI loop can keep
//! drawing while the network calls run:
//!
//! 1. [`ConversationPage::begin_submit`] validates, appends the optimistic
//!    user message and returns an owned [`SubmitJob`].
//! 2. [`SubmitJob::run`] performs the calls, strictly in sequence: persist
//!    the user message, ask the inference endpoint, persist the reply.
//! 3. [`ConversationPage::complete_submit`] applies the [`SubmitOutcome`].
//!
//! [`ConversationPage::submit`] chains all three.

use crate::attachment::{AttachmentFile, PreviewStore};
use crate::backend::{Backend, BackendError, Endpoint, InferenceRequest, SaveMessageRequest};
use crate::composer::{Composer, ComposerEvent};
use crate::identity::IdentityProvider;
use crate::message::{Message, MessageSource};
use crate::topic::Topic;
use std::fmt;
use std::sync::Arc;

/// Question sent with an image when the user typed nothing.
pub const DEFAULT_IMAGE_PROMPT: &str = "What disease does this crop have? and how can I treat it?";

/// Submission state of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStatus {
    /// Ready for input.
    #[default]
    Idle,
    /// A submission is in flight.
    Submitting,
}

/// Why a submission was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Neither text nor an attachment.
    #[error("Nothing to send")]
    Empty,

    /// No signed-in user.
    #[error("Please log in.")]
    Unauthenticated,

    /// Another submission is still in flight.
    #[error("Please wait for the current answer")]
    Busy,

    /// Suggestion index out of range for the topic.
    #[error("No suggestion #{0} for this topic")]
    UnknownSuggestion(usize),

    /// The message store rejected a message.
    #[error("Save failed: {0}")]
    Persist(#[source] BackendError),

    /// The inference endpoint failed.
    #[error("AI Service failed: {0}")]
    Inference(#[source] BackendError),
}

impl SubmitError {
    /// Whether the submission was refused before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SubmitError::Empty
                | SubmitError::Unauthenticated
                | SubmitError::Busy
                | SubmitError::UnknownSuggestion(_)
        )
    }
}

/// Everything needed to perform one submission's network calls.
#[derive(Debug, Clone)]
pub struct SubmitJob {
    /// Author email for both persisted messages.
    pub email: String,
    /// Trimmed question text (may be empty when an image is attached).
    pub text: String,
    /// Image to analyse.
    pub attachment: Option<AttachmentFile>,
    /// Chat id known when the job was created.
    pub chat_id: Option<String>,
    /// Endpoint chosen for the inference call.
    pub endpoint: Endpoint,
    generation: u64,
}

/// Result of running a [`SubmitJob`].
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Chat id after persisting the user message, if that step succeeded.
    pub chat_id: Option<String>,
    /// Reply text, or the step that failed.
    pub result: Result<String, SubmitError>,
    generation: u64,
}

impl SubmitJob {
    /// Build the inference payload, substituting the default prompt for an
    /// image sent without text.
    pub fn inference_request(&self) -> InferenceRequest {
        match &self.attachment {
            Some(file) => InferenceRequest::Image {
                file: file.clone(),
                query: if self.text.is_empty() {
                    DEFAULT_IMAGE_PROMPT.to_string()
                } else {
                    self.text.clone()
                },
            },
            None => InferenceRequest::Text {
                query: self.text.clone(),
            },
        }
    }

    /// Perform the calls in order, stopping at the first failure.
    pub async fn run(self, backend: &dyn Backend) -> SubmitOutcome {
        let generation = self.generation;
        let fail = |chat_id: Option<String>, error: SubmitError| SubmitOutcome {
            chat_id,
            result: Err(error),
            generation,
        };

        let saved = match backend
            .save_message(&SaveMessageRequest {
                email: self.email.clone(),
                message_source: MessageSource::User,
                message: self.text.clone(),
                chat_id: self.chat_id.clone(),
            })
            .await
        {
            Ok(saved) => saved,
            Err(e) => return fail(self.chat_id, SubmitError::Persist(e)),
        };
        let chat_id = saved.chat_id.or_else(|| self.chat_id.clone());
        tracing::debug!(chat_id = ?chat_id, endpoint = self.endpoint.path(), "User message saved");

        let reply = match backend
            .infer(self.endpoint, &self.inference_request())
            .await
        {
            Ok(reply) => reply,
            Err(e) => return fail(chat_id, SubmitError::Inference(e)),
        };

        if let Err(e) = backend
            .save_message(&SaveMessageRequest {
                email: self.email,
                message_source: MessageSource::System,
                message: reply.clone(),
                chat_id: chat_id.clone(),
            })
            .await
        {
            return fail(chat_id, SubmitError::Persist(e));
        }

        SubmitOutcome {
            chat_id,
            result: Ok(reply),
            generation,
        }
    }
}

/// Conversation state for one user.
pub struct ConversationPage {
    topic: Topic,
    messages: Vec<Message>,
    chat_id: Option<String>,
    status: PageStatus,
    /// Bumped whenever the session is reset, so late outcomes are dropped.
    generation: u64,
    composer: Composer,
    identity: Arc<dyn IdentityProvider>,
}

impl fmt::Debug for ConversationPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationPage")
            .field("topic", &self.topic)
            .field("messages", &self.messages.len())
            .field("chat_id", &self.chat_id)
            .field("status", &self.status)
            .field("generation", &self.generation)
            .field("composer", &self.composer)
            .finish_non_exhaustive()
    }
}

impl ConversationPage {
    /// Create an empty conversation on `topic`.
    pub fn new(
        topic: Topic,
        identity: Arc<dyn IdentityProvider>,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        Self {
            topic,
            messages: Vec::new(),
            chat_id: None,
            status: PageStatus::Idle,
            generation: 0,
            composer: Composer::new(previews),
            identity,
        }
    }

    /// Active topic.
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Visible history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Backend chat id of this session, once assigned.
    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Submission state.
    pub fn status(&self) -> PageStatus {
        self.status
    }

    /// Whether a submission is in flight.
    pub fn is_submitting(&self) -> bool {
        self.status == PageStatus::Submitting
    }

    /// Email of the signed-in user.
    pub fn user_email(&self) -> Option<String> {
        self.identity.email()
    }

    /// Suggestions for the active topic.
    pub fn suggestions(&self) -> &'static [&'static str] {
        self.topic.suggestions()
    }

    /// The compose box.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// The compose box, mutably.
    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    /// Validate a submission and append the optimistic user message.
    pub fn begin_submit(
        &mut self,
        text: &str,
        attachment: Option<AttachmentFile>,
    ) -> Result<SubmitJob, SubmitError> {
        let text = text.trim();
        if text.is_empty() && attachment.is_none() {
            return Err(SubmitError::Empty);
        }
        if self.is_submitting() {
            return Err(SubmitError::Busy);
        }
        let Some(email) = self.identity.email() else {
            tracing::warn!("Submission refused: no signed-in user");
            return Err(SubmitError::Unauthenticated);
        };

        let preview = attachment.as_ref().map(AttachmentFile::to_data_url);
        self.messages.push(Message::user(text, preview));
        self.status = PageStatus::Submitting;
        self.composer.set_disabled(true);

        let endpoint = Endpoint::select(self.topic, attachment.is_some());
        tracing::info!(
            topic = %self.topic,
            endpoint = endpoint.path(),
            has_image = attachment.is_some(),
            "Submitting message"
        );

        Ok(SubmitJob {
            email,
            text: text.to_string(),
            attachment,
            chat_id: self.chat_id.clone(),
            endpoint,
            generation: self.generation,
        })
    }

    /// Start a submission from a composer event.
    pub fn handle_composer_event(
        &mut self,
        event: ComposerEvent,
    ) -> Result<SubmitJob, SubmitError> {
        match event {
            ComposerEvent::SendText(text) => self.begin_submit(&text, None),
            ComposerEvent::SendImage { file, caption } => {
                self.begin_submit(caption.as_deref().unwrap_or_default(), Some(file))
            }
        }
    }

    /// Start a submission of one of the topic's suggestions.
    pub fn submit_suggestion(&mut self, index: usize) -> Result<SubmitJob, SubmitError> {
        let text = self
            .suggestions()
            .get(index)
            .copied()
            .ok_or(SubmitError::UnknownSuggestion(index))?;
        self.begin_submit(text, None)
    }

    /// Apply the outcome of a job started by this page.
    ///
    /// Outcomes from before a topic switch or new chat are dropped. Failures
    /// are returned for the caller to show; the optimistic user message stays.
    pub fn complete_submit(&mut self, outcome: SubmitOutcome) -> Result<(), SubmitError> {
        if outcome.generation != self.generation {
            tracing::info!(
                stale = outcome.generation,
                current = self.generation,
                "Dropping outcome from a previous session"
            );
            return Ok(());
        }

        self.status = PageStatus::Idle;
        self.composer.set_disabled(false);
        if self.chat_id.is_none() {
            self.chat_id = outcome.chat_id;
        }

        match outcome.result {
            Ok(reply) => {
                self.messages.push(Message::system(reply));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Submission failed");
                Err(e)
            }
        }
    }

    /// Submit and wait for the whole round trip.
    pub async fn submit(
        &mut self,
        backend: &dyn Backend,
        text: &str,
        attachment: Option<AttachmentFile>,
    ) -> Result<(), SubmitError> {
        let job = self.begin_submit(text, attachment)?;
        let outcome = job.run(backend).await;
        self.complete_submit(outcome)
    }

    /// Switch topic, clearing the session.
    pub fn switch_topic(&mut self, topic: Topic) {
        tracing::info!(from = %self.topic, to = %topic, "Switching topic");
        self.topic = topic;
        self.start_new_chat();
    }

    /// Clear history, draft, attachment and chat id.
    pub fn start_new_chat(&mut self) {
        self.messages.clear();
        self.chat_id = None;
        self.composer.reset();
        self.composer.set_disabled(false);
        self.status = PageStatus::Idle;
        self.generation += 1;
    }
}
