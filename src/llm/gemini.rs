use super::{LlmError, Prompt, TextGenerator};
use crate::config::{GeminiSettings, UpstreamSettings};
use crate::retry::{RetryPolicy, with_retry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Harm categories relaxed to `BLOCK_NONE` on every request.
const RELAXED_CATEGORIES: [&str; 5] = [
    "HARM_CATEGORY_DANGEROUS",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Google generative-language client bound to a single model.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Build a client from provider settings.
    pub fn new(settings: &GeminiSettings, upstream: &UpstreamSettings) -> Result<Self, LlmError> {
        let http = Client::builder()
            .user_agent("docscribe/gemini")
            .timeout(upstream.timeout)
            .build()
            .map_err(|error| LlmError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            retry: RetryPolicy::from(upstream),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn send(&self, request: &GenerateRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|error| LlmError::from_transport("Gemini", error))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedStatus { status, body });
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode generateContent: {error}"))
        })?;
        tracing::debug!(
            model = %self.model,
            feedback = ?body.prompt_feedback,
            "Gemini prompt feedback"
        );

        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Err(LlmError::ContentBlocked(reason));
        }

        let candidate =
            body.candidates.into_iter().next().ok_or_else(|| {
                LlmError::ContentBlocked("no candidates returned for prompt".into())
            })?;
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(LlmError::ContentBlocked("SAFETY".into()));
        }

        candidate
            .content
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .ok_or_else(|| LlmError::InvalidResponse("candidate had no text part".into()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: Vec<SafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: &prompt.user }],
            }],
            safety_settings: RELAXED_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
            system_instruction: prompt.system.as_deref().map(|system| Content {
                role: None,
                parts: vec![RequestPart { text: system }],
            }),
        };

        tracing::debug!(model = %self.model, "Requesting content generation");
        with_retry(self.retry, "gemini.generate", || self.send(&request)).await
    }
}
