//! Text-generation capability and its hosted-provider adapters.
//!
//! Workflows only see [`TextGenerator`]; each provider lives in its own submodule and talks to
//! the vendor's REST API through `reqwest`, so swapping providers never touches orchestration.

mod gemini;
mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiChatClient;

use crate::retry::Transient;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by text-generation providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider could not be reached or the HTTP client failed to build.
    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Request exceeded the configured upstream timeout.
    #[error("LLM request timed out")]
    Timeout,
    /// Provider answered with a non-success status.
    #[error("LLM provider returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code reported by the provider.
        status: StatusCode,
        /// Raw response body for diagnostics.
        body: String,
    },
    /// Provider refused the prompt or the completion on policy grounds.
    #[error("Content blocked by provider: {0}")]
    ContentBlocked(String),
    /// Response decoded but did not contain usable text.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub(crate) fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::ProviderUnavailable(format!("failed to reach {provider}: {error}"))
        }
    }
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            Self::ProviderUnavailable(_) | Self::Timeout => true,
            Self::UnexpectedStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::ContentBlocked(_) | Self::InvalidResponse(_) => false,
        }
    }
}

/// Prompt handed to a provider: optional system instruction plus the user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Instruction placed in the system role when the provider supports one.
    pub system: Option<String>,
    /// User message content.
    pub user: String,
}

impl Prompt {
    /// Prompt consisting of a single user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
        }
    }

    /// Prompt with a system instruction followed by a user message.
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }
}

/// Interface implemented by hosted text-generation providers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion for `prompt`.
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError>;
}
