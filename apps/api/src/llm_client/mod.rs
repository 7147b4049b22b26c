//! Completion client — the single point of entry for calls to the external
//! chat-completion endpoint.
//!
//! ARCHITECTURAL RULE: No other module may call the completion endpoint directly.
//! All model interactions MUST go through this module.
//!
//! One attempt per call. There is no retry; the caller owns that policy.
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod transport;

use crate::config::Config;
use transport::{CompletionTransport, HttpTransport};

/// Low-randomness decoding for consistent, analytic answers.
pub const TEMPERATURE: f32 = 0.2;
pub const MAX_TOKENS: u32 = 1000;
/// Upstream error text is shown to the caller; keep it to a readable length.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("An API key is required to query the completion service")]
    MissingCredential,

    #[error("Completion service rejected the request (status {status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Completion service returned an unexpected response: {0}")]
    MalformedResponse(String),

    #[error("Could not reach the completion service: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

/// The completion client used by the LLM-backed resolver.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn CompletionTransport>,
    model: String,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn CompletionTransport>, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
        }
    }

    /// Builds a client backed by `reqwest` using the configured endpoint and model.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(
            config.completion_api_url.clone(),
            std::time::Duration::from_secs(config.completion_timeout_secs),
        )?;
        Ok(Self::new(Arc::new(transport), config.completion_model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, question: &str, context: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: context.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: question.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Sends `context` as the system message and `question` as the user message,
    /// returning the first choice's content.
    ///
    /// Fails with `MissingCredential` before touching the network when the
    /// credential is empty.
    pub async fn ask(
        &self,
        question: &str,
        context: &str,
        credential: &str,
    ) -> Result<String, RequestError> {
        if credential.trim().is_empty() {
            return Err(RequestError::MissingCredential);
        }

        let request = self.build_request(question, context);
        let response = self.transport.send(&request, credential).await?;

        if !(200..300).contains(&response.status) {
            warn!("Completion endpoint returned {}", response.status);
            let message = serde_json::from_str::<UpstreamError>(&response.body)
                .map(|e| e.error.message)
                .unwrap_or(response.body);
            return Err(RequestError::UpstreamRejected {
                status: response.status,
                message: truncate_message(&message),
            });
        }

        let text = extract_answer(&response.body)?;
        debug!("Completion succeeded: {} chars", text.len());
        Ok(text)
    }
}

fn truncate_message(message: &str) -> String {
    let message = message.trim();
    if message.is_empty() {
        return "no error detail".to_string();
    }
    match message.char_indices().nth(MAX_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

/// Pulls `choices[0].message.content` out of a success body.
fn extract_answer(body: &str) -> Result<String, RequestError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| RequestError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RequestError::MalformedResponse("missing choices[0].message.content".into()))
}
