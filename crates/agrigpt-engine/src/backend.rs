//! Advisory backend client.
//!
//! The backend exposes a message store (`/chats`) and three inference
//! endpoints. [`Backend`] is the seam the conversation page talks to;
//! [`HttpBackend`] is the reqwest implementation.

use crate::attachment::AttachmentFile;
use crate::config::Config;
use crate::message::MessageSource;
use crate::topic::Topic;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reply used when the backend answers with neither `answer` nor `response`.
pub const FALLBACK_REPLY: &str = "Message processed.";

/// Path of the message store.
const CHATS_PATH: &str = "/chats";

/// An inference endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// General crop consultant, JSON `{query}`.
    AskConsultant,
    /// Government schemes assistant, JSON `{query}`.
    GovernmentSchemes,
    /// Image diagnosis, multipart `{file, query}`.
    AskWithImage,
}

impl Endpoint {
    /// Pick the endpoint for a submission.
    ///
    /// An attachment always goes to the image endpoint; otherwise the topic
    /// decides.
    pub fn select(topic: Topic, has_attachment: bool) -> Self {
        if has_attachment {
            Endpoint::AskWithImage
        } else if topic == Topic::GovernmentSchemes {
            Endpoint::GovernmentSchemes
        } else {
            Endpoint::AskConsultant
        }
    }

    /// Path relative to the backend base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::AskConsultant => "/ask-consultant",
            Endpoint::GovernmentSchemes => "/query-government-schemes",
            Endpoint::AskWithImage => "/ask-with-image",
        }
    }
}

/// Body of `POST /chats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessageRequest {
    /// Email of the author's account.
    pub email: String,
    /// Who wrote the message.
    pub message_source: MessageSource,
    /// Message text.
    pub message: String,
    /// Chat to append to; omitted for the first message of a session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

/// Response of `POST /chats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessageResponse {
    /// Chat the message was stored under.
    #[serde(default)]
    pub chat_id: Option<String>,
}

/// Payload for an inference call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceRequest {
    /// Text-only question, sent as JSON.
    Text { query: String },
    /// Image plus question, sent as multipart form data.
    Image { file: AttachmentFile, query: String },
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// Response of the inference endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl InferenceResponse {
    /// Reply text: `answer`, else `response`, else [`FALLBACK_REPLY`].
    /// Empty strings count as missing.
    pub fn into_text(self) -> String {
        self.answer
            .filter(|a| !a.is_empty())
            .or(self.response.filter(|r| !r.is_empty()))
            .unwrap_or_else(|| FALLBACK_REPLY.to_string())
    }
}

/// The advisory backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Persist one message and return the chat it belongs to.
    async fn save_message(
        &self,
        request: &SaveMessageRequest,
    ) -> Result<SaveMessageResponse, BackendError>;

    /// Ask an inference endpoint and return the reply text.
    async fn infer(
        &self,
        endpoint: Endpoint,
        request: &InferenceRequest,
    ) -> Result<String, BackendError>;
}

/// Errors talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport failure (connect, timeout, reading the body).
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Response body was not the expected JSON.
    #[error("Invalid response from {endpoint}: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    /// The attachment could not be encoded into the multipart body.
    #[error("Could not attach file: {0}")]
    Attachment(String),
}

/// reqwest-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        Self::new(
            config.base_url(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        endpoint: &'static str,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| BackendError::Request { endpoint, source })?;

        if !status.is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode {
            endpoint,
            message: format!("{e} - body: {body}"),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn save_message(
        &self,
        request: &SaveMessageRequest,
    ) -> Result<SaveMessageResponse, BackendError> {
        tracing::debug!(
            source = request.message_source.as_str(),
            chat_id = ?request.chat_id,
            "Saving message"
        );
        let response = self
            .client
            .post(self.url(CHATS_PATH))
            .json(request)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                endpoint: CHATS_PATH,
                source,
            })?;

        Self::read_json(CHATS_PATH, response).await
    }

    async fn infer(
        &self,
        endpoint: Endpoint,
        request: &InferenceRequest,
    ) -> Result<String, BackendError> {
        let path = endpoint.path();
        tracing::debug!(endpoint = path, "Calling inference endpoint");

        let builder = self.client.post(self.url(path));
        let builder = match request {
            InferenceRequest::Text { query } => builder.json(&QueryBody { query }),
            InferenceRequest::Image { file, query } => {
                let part = Part::bytes(file.bytes.clone())
                    .file_name(file.name.clone())
                    .mime_str(&file.mime)
                    .map_err(|e| BackendError::Attachment(e.to_string()))?;
                let form = Form::new().part("file", part).text("query", query.clone());
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|source| BackendError::Request {
                endpoint: path,
                source,
            })?;

        let parsed: InferenceResponse = Self::read_json(path, response).await?;
        Ok(parsed.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpBackend {
        HttpBackend::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_selection() {
        for topic in Topic::ALL {
            assert_eq!(Endpoint::select(topic, true), Endpoint::AskWithImage);
        }
        assert_eq!(
            Endpoint::select(Topic::GovernmentSchemes, false),
            Endpoint::GovernmentSchemes
        );
        assert_eq!(
            Endpoint::select(Topic::CitrusCrop, false),
            Endpoint::AskConsultant
        );
    }

    #[test]
    fn test_reply_precedence() {
        let both = InferenceResponse {
            answer: Some("a".into()),
            response: Some("r".into()),
        };
        assert_eq!(both.into_text(), "a");

        let response_only = InferenceResponse {
            answer: Some(String::new()),
            response: Some("r".into()),
        };
        assert_eq!(response_only.into_text(), "r");

        assert_eq!(InferenceResponse::default().into_text(), FALLBACK_REPLY);
    }

    #[test]
    fn test_save_request_wire_format() {
        let first = SaveMessageRequest {
            email: "grower@example.com".into(),
            message_source: MessageSource::User,
            message: "Help me identify citrus disease".into(),
            chat_id: None,
        };
        insta::assert_json_snapshot!(first, @r###"
        {
          "email": "grower@example.com",
          "messageSource": "user",
          "message": "Help me identify citrus disease"
        }
        "###);

        let reply = SaveMessageRequest {
            email: "grower@example.com".into(),
            message_source: MessageSource::System,
            message: "Greening".into(),
            chat_id: Some("chat-7".into()),
        };
        insta::assert_json_snapshot!(reply, @r###"
        {
          "email": "grower@example.com",
          "messageSource": "system",
          "message": "Greening",
          "chatId": "chat-7"
        }
        "###);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:1/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:1/api");
        assert_eq!(backend.url("/chats"), "http://localhost:1/api/chats");
    }

    #[tokio::test]
    async fn test_save_message_returns_chat_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chats"))
            .and(body_json(json!({
                "email": "grower@example.com",
                "messageSource": "user",
                "message": "hello",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chatId": "abc"})))
            .expect(1)
            .mount(&server)
            .await;

        let saved = backend(&server)
            .save_message(&SaveMessageRequest {
                email: "grower@example.com".into(),
                message_source: MessageSource::User,
                message: "hello".into(),
                chat_id: None,
            })
            .await
            .unwrap();
        assert_eq!(saved.chat_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_save_message_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chats"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .save_message(&SaveMessageRequest {
                email: "grower@example.com".into(),
                message_source: MessageSource::User,
                message: "hello".into(),
                chat_id: None,
            })
            .await
            .unwrap_err();
        match err {
            BackendError::Status {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(endpoint, "/chats");
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_text_inference_posts_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query-government-schemes"))
            .and(body_json(json!({"query": "PM-KISAN eligibility"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Small farmers"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend(&server)
            .infer(
                Endpoint::GovernmentSchemes,
                &InferenceRequest::Text {
                    query: "PM-KISAN eligibility".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(reply, "Small farmers");
    }

    #[tokio::test]
    async fn test_image_inference_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask-with-image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "Citrus canker"})))
            .expect(1)
            .mount(&server)
            .await;

        let reply = backend(&server)
            .infer(
                Endpoint::AskWithImage,
                &InferenceRequest::Image {
                    file: AttachmentFile::new("leaf.png", "image/png", b"PNGDATA".to_vec()),
                    query: "What is this spot?".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(reply, "Citrus canker");

        let requests = server.received_requests().await.unwrap();
        let request = &requests[0];
        let content_type = request
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));

        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("name=\"file\""));
        assert!(body.contains("filename=\"leaf.png\""));
        assert!(body.contains("PNGDATA"));
        assert!(body.contains("name=\"query\""));
        assert!(body.contains("What is this spot?"));
    }

    #[tokio::test]
    async fn test_inference_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask-consultant"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = backend(&server)
            .infer(
                Endpoint::AskConsultant,
                &InferenceRequest::Text {
                    query: "hi".into(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode { endpoint: "/ask-consultant", .. }));
    }
}
