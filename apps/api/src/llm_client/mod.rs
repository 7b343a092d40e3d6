//! Completion client: every interviewer message is produced here.
//!
//! Handlers and the orchestrator only see `CompletionProxy`; nothing else talks
//! to the vendor endpoint.
//!
//! Speaks the OpenAI-compatible chat-completions protocol (Groq by default).
//! One request per turn, never retried here: a failed turn is surfaced to the
//! caller, who decides what the user sees.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::interview::policy::{build_instruction, InterviewStage};
use crate::interview::prompts::FALLBACK_REPLY;
use crate::models::interview::{Level, Speaker, Turn};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Upper bound on generated tokens per turn. An evaluation fits comfortably.
const MAX_TOKENS: u32 = 500;
/// Moderate, non-zero: varied phrasing that still follows the policy.
const TEMPERATURE: f64 = 0.7;

/// Network-level failure reasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion credential is not configured")]
    Configuration,

    #[error("API error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(TransportFailure),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        let failure = if e.is_timeout() {
            TransportFailure::Timeout
        } else if e.is_connect() {
            TransportFailure::Connect(e.to_string())
        } else if e.is_decode() {
            TransportFailure::Decode(e.to_string())
        } else {
            TransportFailure::Other(e.to_string())
        };
        LlmError::Transport(failure)
    }
}

/// Everything the proxy needs to produce the next interviewer message.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub role: &'a str,
    pub level: Level,
    pub stage: InterviewStage,
    /// Outbound transcript, oldest first. Error notices must already be removed.
    pub transcript: &'a [Turn],
}

/// The completion boundary. Stateless: every call stands alone.
///
/// Carried in `AppState` as `Arc<dyn CompletionProxy>` so tests can substitute it.
#[async_trait]
pub trait CompletionProxy: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if it carries any.
    fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

/// Maps our speakers onto the vendor's role labels.
fn speaker_label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::Candidate => "user",
        Speaker::Interviewer => "assistant",
    }
}

/// Policy instruction first, then the transcript in conversational order.
fn build_messages<'a>(instruction: &'a str, transcript: &'a [Turn]) -> Vec<ChatMessage<'a>> {
    std::iter::once(ChatMessage {
        role: "system",
        content: instruction,
    })
    .chain(transcript.iter().map(|turn| ChatMessage {
        role: speaker_label(turn.speaker),
        content: &turn.text,
    }))
    .collect()
}

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    api_key: Option<Secret<String>>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// A blank key is treated as absent.
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.expose_secret().trim().is_empty()),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// The completion client used by the orchestrator and the stateless turn endpoint.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionProxy for LlmClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            warn!("Completion requested but no credential is configured");
            return Err(LlmError::Configuration);
        };

        let instruction = build_instruction(request.role, request.level, request.stage);
        let body = ChatRequest {
            model: &self.config.model,
            messages: build_messages(&instruction, request.transcript),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let err = LlmError::from(e);
                warn!("Completion request failed: {err}");
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Completion API returned {}: {}", status, body);
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            let err = LlmError::from(e);
            warn!("Completion response unreadable: {err}");
            err
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(match parsed.first_text() {
            Some(text) => text.to_string(),
            None => {
                warn!("Completion response carried no message text, using fallback reply");
                FALLBACK_REPLY.to_string()
            }
        })
    }
}
