//! HTTP surface for docscribe.
//!
//! Every route is a `POST` with a JSON body and requires an `Authorization` header equal to
//! the configured shared secret:
//!
//! - `POST /text-to-speech` – Synthesize `text` and upload it as `file_name`; returns
//!   `{ "file_name" }`.
//! - `POST /paragraph-heading` – Generate a heading for `paragraph`; returns `{ "heading" }`.
//! - `POST /similar-text` – Describe what `paragraph1` and `paragraph2` share; returns
//!   `{ "similar_text" }`.
//! - `POST /summary` – Summarize the stored PDF `file_name`; returns `{ "summary" }`.
//!
//! A missing or wrong secret yields 401 before the body is read, a malformed body 400 with a
//! reason, and any workflow failure 400 with one generic message while the detail is logged.

use crate::logging::request_span;
use crate::processing::{AssistApi, AssistError};
use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::Instrument;

/// Plain-text body returned for every workflow failure.
pub const SERVICE_ERROR_MESSAGE: &str = "We apologize for the inconvenience. Our server is \
currently experiencing technical difficulties, which are likely temporary. Please try your \
request again in a little while.";

/// Speech synthesis route.
pub const TEXT_TO_SPEECH_ROUTE: &str = "/text-to-speech";
/// Heading generation route.
pub const PARAGRAPH_HEADING_ROUTE: &str = "/paragraph-heading";
/// Similarity detection route.
pub const SIMILAR_TEXT_ROUTE: &str = "/similar-text";
/// Document summarization route.
pub const SUMMARY_ROUTE: &str = "/summary";

/// Build the HTTP router guarding every route with `security_key`.
pub fn create_router<S>(service: Arc<S>, security_key: impl Into<Arc<str>>) -> Router
where
    S: AssistApi + 'static,
{
    let key = SecurityKey(security_key.into());
    Router::new()
        .route(TEXT_TO_SPEECH_ROUTE, post(text_to_speech::<S>))
        .route(PARAGRAPH_HEADING_ROUTE, post(paragraph_heading::<S>))
        .route(SIMILAR_TEXT_ROUTE, post(similar_text::<S>))
        .route(SUMMARY_ROUTE, post(summary::<S>))
        .route_layer(middleware::from_fn_with_state(key, authorize))
        .with_state(service)
}

#[derive(Clone)]
struct SecurityKey(Arc<str>);

impl SecurityKey {
    fn matches(&self, presented: &[u8]) -> bool {
        let expected = self.0.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected.ct_eq(presented).into()
    }
}

/// Reject requests without the shared secret, then run the handler inside a request span.
async fn authorize(State(key): State<SecurityKey>, request: Request, next: Next) -> Response {
    let span = request_span(request.uri().path());
    async move {
        let authorized = request
            .headers()
            .get(AUTHORIZATION)
            .is_some_and(|value| key.matches(value.as_bytes()));
        if !authorized {
            tracing::warn!("Rejected request without a valid security key");
            return ApiError::Unauthorized.into_response();
        }
        next.run(request).await
    }
    .instrument(span)
    .await
}

/// Request body for `POST /text-to-speech`.
#[derive(Deserialize)]
struct SpeechRequest {
    /// Text to read aloud.
    #[serde(default)]
    text: Option<String>,
    /// Blob name the audio is stored under.
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Serialize)]
struct SpeechResponse {
    file_name: String,
}

async fn text_to_speech<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Json<SpeechResponse>, ApiError>
where
    S: AssistApi,
{
    let Json(request) = payload?;
    let text = required(request.text, "text")?;
    let file_name = required(request.file_name, "file_name")?;
    let file_name = service.synthesize_speech(&text, &file_name).await?;
    tracing::info!(file_name = %file_name, "Speech request completed");
    Ok(Json(SpeechResponse { file_name }))
}

/// Request body for `POST /paragraph-heading`.
#[derive(Deserialize)]
struct HeadingRequest {
    #[serde(default)]
    paragraph: Option<String>,
}

#[derive(Serialize)]
struct HeadingResponse {
    heading: String,
}

async fn paragraph_heading<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<HeadingRequest>, JsonRejection>,
) -> Result<Json<HeadingResponse>, ApiError>
where
    S: AssistApi,
{
    let Json(request) = payload?;
    let paragraph = required(request.paragraph, "paragraph")?;
    let heading = service.generate_heading(&paragraph).await?;
    Ok(Json(HeadingResponse { heading }))
}

/// Request body for `POST /similar-text`.
#[derive(Deserialize)]
struct SimilarityRequest {
    #[serde(default)]
    paragraph1: Option<String>,
    #[serde(default)]
    paragraph2: Option<String>,
}

#[derive(Serialize)]
struct SimilarityResponse {
    similar_text: String,
}

async fn similar_text<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SimilarityRequest>, JsonRejection>,
) -> Result<Json<SimilarityResponse>, ApiError>
where
    S: AssistApi,
{
    let Json(request) = payload?;
    let first = required(request.paragraph1, "paragraph1")?;
    let second = required(request.paragraph2, "paragraph2")?;
    let similar_text = service.find_similar_text(&first, &second).await?;
    Ok(Json(SimilarityResponse { similar_text }))
}

/// Request body for `POST /summary`.
#[derive(Deserialize)]
struct SummaryRequest {
    /// Name of the PDF in the document container.
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn summary<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError>
where
    S: AssistApi,
{
    let Json(request) = payload?;
    let file_name = required(request.file_name, "file_name")?;
    let summary = service.summarize_document(&file_name).await?;
    tracing::info!(
        file_name = %file_name,
        chars = summary.chars().count(),
        "Summary request completed"
    );
    Ok(Json(SummaryResponse { summary }))
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!(
            "Missing required field: {field}"
        ))),
    }
}

enum ApiError {
    Unauthorized,
    BadRequest(String),
    Service(AssistError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthorized" })),
            )
                .into_response(),
            Self::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": reason }))).into_response()
            }
            Self::Service(error) => {
                tracing::error!(error = %error, "Workflow failed");
                (StatusCode::BAD_REQUEST, SERVICE_ERROR_MESSAGE).into_response()
            }
        }
    }
}

impl From<AssistError> for ApiError {
    fn from(inner: AssistError) -> Self {
        Self::Service(inner)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
