//! Text-generation capability used by the AI helper endpoints.
//!
//! Handlers only see [`CompletionClient`]; [`GroqClient`] talks to any
//! OpenAI-compatible chat-completions API.

pub mod groq;
pub mod prompts;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

pub use groq::GroqClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI service unavailable")]
    Unavailable,

    #[error("Invalid response from AI service: {0}")]
    InvalidResponse(String),

    #[error("AI transport error: {0}")]
    Transport(String),

    #[error("AI upstream error: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        AiError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

pub type TokenStream = BoxStream<'static, Result<String, AiError>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// False when no credential is configured; callers answer 503 without
    /// making any outbound request.
    fn is_configured(&self) -> bool;

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, AiError>;

    /// Incremental tokens. Dropping the stream stops reading upstream.
    async fn stream(&self, prompt: &str, options: &CompletionOptions) -> Result<TokenStream, AiError>;
}

/// Parse a model reply that should be JSON, tolerating a ```json fence.
pub fn parse_json_reply(reply: &str) -> Result<Value, AiError> {
    let trimmed = reply.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(body).map_err(|_| AiError::InvalidResponse(reply.to_string()))
}
