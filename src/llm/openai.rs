use super::{LlmError, Prompt, TextGenerator};
use crate::config::{OpenAiSettings, UpstreamSettings};
use crate::retry::{RetryPolicy, with_retry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Chat-completions client bound to a single model.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    retry: RetryPolicy,
}

impl OpenAiChatClient {
    /// Build a client for `model` using the shared provider settings.
    pub fn new(
        settings: &OpenAiSettings,
        upstream: &UpstreamSettings,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let http = Client::builder()
            .user_agent("docscribe/openai")
            .timeout(upstream.timeout)
            .build()
            .map_err(|error| LlmError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: model.into(),
            max_tokens: None,
            retry: RetryPolicy::from(upstream),
        })
    }

    /// Cap the completion length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|error| LlmError::from_transport("OpenAI", error))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedStatus { status, body });
        }

        let body: ChatResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode chat completion: {error}"))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("completion had no choices".into()))?;
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(LlmError::ContentBlocked("content_filter".into()));
        }
        choice
            .message
            .content
            .map(|content| content.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse("completion message had no content".into()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        tracing::debug!(model = %self.model, "Requesting chat completion");
        with_retry(self.retry, "openai.chat", || self.send(&request)).await
    }
}
