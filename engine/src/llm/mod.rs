//! Completion Provider Abstraction Layer
//!
//! The planner and the answer synthesizer both talk to a chat-completion
//! service. The `CompletionProvider` trait is the seam: production uses the
//! OpenAI-compatible HTTP provider, tests use wiremock or in-process fakes.
//!
//! Connection details are not owned by the provider. Every call receives the
//! `LlmSettings` snapshot resolved for the current request.

use async_trait::async_trait;
use serde::Serialize;

use crate::settings::LlmSettings;

pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
///
/// Callers treat every variant the same way (planner fallback or raw
/// evidence answer); the variants exist for logging.
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

/// Message in a completion request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    System,
}

/// A single chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Build the system + user pair both callers send
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
            temperature,
            max_tokens,
        }
    }
}

/// Completion provider trait that all providers must implement
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider
    fn name(&self) -> &str;

    /// Run one completion and return the content of the first choice
    ///
    /// # Returns
    /// * `Ok(String)` - The untrimmed content of `choices[0].message.content`
    /// * `Err(LLMError)` - Non-2xx status, transport failure, or no choices
    async fn complete(&self, settings: &LlmSettings, request: &CompletionRequest)
        -> Result<String>;
}

/// Strip markdown code-fence markers wrapping a model response.
///
/// Handles a leading ` ```json ` or ` ``` ` and a trailing ` ``` `; text
/// without fences is returned trimmed.
pub fn strip_code_fences(content: &str) -> &str {
    let mut body = content.trim();

    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }

    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    body.trim()
}
