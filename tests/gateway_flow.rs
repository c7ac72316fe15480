//! End-to-end flows through the router with every provider mocked over HTTP.

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use docscribe::{
    api::{self, SERVICE_ERROR_MESSAGE},
    config::{
        Config, GeminiSettings, OpenAiSettings, SpeechSettings, StorageSettings, SummarySettings,
        UpstreamSettings,
    },
    llm::{GeminiClient, OpenAiChatClient},
    processing::{
        AssistService, Collaborators, Document, ExtractionError, chunking, extract::TextExtractor,
    },
    speech::GoogleTranslateTts,
    storage::AzureBlobClient,
};
use httpmock::{
    Method::{GET, POST, PUT},
    MockServer,
};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SECRET: &str = "gateway-secret";
const CHUNK_SIZE: usize = 60;
const CHUNK_OVERLAP: usize = 5;

/// Treats stored documents as UTF-8 so tests need no PDF fixtures.
struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, document: Document) -> Result<String, ExtractionError> {
        String::from_utf8(document.bytes)
            .map_err(|error| ExtractionError::Unparseable(error.to_string()))
    }
}

fn config_for(server: &MockServer, scratch: &Path) -> Config {
    Config {
        security_key: SECRET.into(),
        openai: OpenAiSettings {
            api_key: "sk-test".into(),
            base_url: server.url("/v1"),
            summary_model: "summary-model".into(),
            similarity_model: "similarity-model".into(),
            similarity_max_tokens: 2000,
        },
        gemini: GeminiSettings {
            api_key: "g-key".into(),
            base_url: server.url("/gemini"),
            model: "heading-model".into(),
        },
        storage: StorageSettings {
            connection_string: format!(
                "BlobEndpoint={};SharedAccessSignature=sv=2022-11-02&sig=token",
                server.url("/blob")
            ),
            document_container: "documents".into(),
            audio_container: "audio".into(),
        },
        speech: SpeechSettings {
            base_url: server.url("/tts"),
            language: "en".into(),
            scratch_dir: scratch.to_path_buf(),
        },
        summary: SummarySettings {
            chunk_size: CHUNK_SIZE,
            chunk_overlap: CHUNK_OVERLAP,
            max_segments: 32,
            concurrency: 2,
            combine_max_chars: 12_000,
        },
        upstream: UpstreamSettings {
            timeout: Duration::from_secs(5),
            max_retries: 0,
        },
        request_timeout: Duration::from_secs(30),
        server_port: None,
    }
}

fn gateway(config: &Config) -> Router {
    let summary = OpenAiChatClient::new(
        &config.openai,
        &config.upstream,
        config.openai.summary_model.clone(),
    )
    .expect("summary client");
    let similarity = OpenAiChatClient::new(
        &config.openai,
        &config.upstream,
        config.openai.similarity_model.clone(),
    )
    .expect("similarity client")
    .with_max_tokens(config.openai.similarity_max_tokens);
    let service = AssistService::new(
        Collaborators {
            heading: Arc::new(GeminiClient::new(&config.gemini, &config.upstream).expect("gemini")),
            similarity: Arc::new(similarity),
            summary: Arc::new(summary),
            speech: Arc::new(
                GoogleTranslateTts::new(&config.speech, &config.upstream).expect("tts"),
            ),
            store: Arc::new(AzureBlobClient::new(&config.storage, &config.upstream).expect("blob")),
            extractor: Arc::new(PlainTextExtractor),
        },
        config,
    );
    api::create_router(Arc::new(service), config.security_key.as_str())
}

async fn call(app: Router, route: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(route)
                .header("content-type", "application/json")
                .header("authorization", SECRET)
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, bytes.to_vec())
}

fn chat_reply(content: &str) -> Value {
    json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn missing_document_returns_generic_error_and_uploads_nothing() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());

    let fetch = server
        .mock_async(|when, then| {
            when.method(GET).path("/blob/documents/report.pdf");
            then.status(404).body("BlobNotFound");
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(PUT);
            then.status(201);
        })
        .await;
    let completions = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(chat_reply("unused"));
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/summary",
        json!({ "file_name": "report.pdf" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).expect("utf8"),
        SERVICE_ERROR_MESSAGE
    );
    fetch.assert_async().await;
    assert_eq!(upload.hits_async().await, 0);
    assert_eq!(completions.hits_async().await, 0);
}

#[tokio::test]
async fn speech_is_uploaded_to_audio_container_without_leaving_scratch_files() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());

    let tts = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tts/translate_tts")
                .query_param("tl", "en")
                .query_param("q", "Hello world");
            then.status(200)
                .header("content-type", "audio/mpeg")
                .body("ID3-audio");
        })
        .await;
    let upload = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/blob/audio/hello.mp3")
                .query_param("sig", "token")
                .header("x-ms-blob-type", "BlockBlob")
                .header("content-type", "audio/mpeg")
                .body("ID3-audio");
            then.status(201);
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/text-to-speech",
        json!({ "text": "# Hello *world*", "file_name": "hello.mp3" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body, json!({ "file_name": "hello.mp3" }));
    tts.assert_async().await;
    upload.assert_async().await;
    let leftovers = std::fs::read_dir(scratch.path())
        .expect("scratch dir")
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn heading_is_returned_without_markup() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());

    let gemini = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/gemini/models/heading-model:generateContent")
                .query_param("key", "g-key")
                .body_contains("Our launch went smoothly");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "parts": [{ "text": "**\"Launch Day Recap\"**\n" }],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }]
            }));
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/paragraph-heading",
        json!({ "paragraph": "Our launch went smoothly and customers noticed." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body, json!({ "heading": "Launch Day Recap" }));
    gemini.assert_async().await;
}

#[tokio::test]
async fn similarity_uses_configured_model() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());

    let completion = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_contains("similarity-model")
                .body_contains("paragraph1 = Cats sleep a lot., paragraph2 = Cats nap often.");
            then.status(200)
                .json_body(chat_reply("Both say cats rest frequently."));
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/similar-text",
        json!({ "paragraph1": "Cats sleep a lot.", "paragraph2": "Cats nap often." }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(
        body,
        json!({ "similar_text": "Both say cats rest frequently." })
    );
    completion.assert_async().await;
}

const REPORT: &str = "Revenue grew in every region during the third quarter. Operating costs \
fell slightly while hiring continued in engineering. Customer churn reached a two year low. \
Management expects the positive trend to continue into next year.";

#[tokio::test]
async fn summary_maps_every_segment_then_combines_once() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());
    let expected_segments = chunking::chunk(REPORT, CHUNK_SIZE, CHUNK_OVERLAP)
        .expect("valid chunking")
        .count();

    server
        .mock_async(|when, then| {
            when.method(GET).path("/blob/documents/q3.pdf");
            then.status(200).body(REPORT);
        })
        .await;
    let segments = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("summary-model")
                .body_contains("Summarize the following passage");
            then.status(200).json_body(chat_reply("segment summary"));
        })
        .await;
    let combine = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Partial summaries:");
            then.status(200)
                .json_body(chat_reply("A strong quarter with lower costs."));
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/summary",
        json!({ "file_name": "q3.pdf" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(
        body,
        json!({ "summary": "A strong quarter with lower costs." })
    );
    assert!(expected_segments > 1);
    assert_eq!(segments.hits_async().await, expected_segments);
    assert_eq!(combine.hits_async().await, 1);
}

#[tokio::test]
async fn failed_segment_summary_aborts_without_combining() {
    let server = MockServer::start_async().await;
    let scratch = tempfile::tempdir().expect("tempdir");
    let config = config_for(&server, scratch.path());

    server
        .mock_async(|when, then| {
            when.method(GET).path("/blob/documents/q3.pdf");
            then.status(200).body(REPORT);
        })
        .await;
    let segments = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Summarize the following passage");
            then.status(500).body("upstream exploded");
        })
        .await;
    let combine = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("Partial summaries:");
            then.status(200)
                .json_body(chat_reply("should never be produced"));
        })
        .await;

    let (status, body) = call(
        gateway(&config),
        "/summary",
        json!({ "file_name": "q3.pdf" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).expect("utf8"),
        SERVICE_ERROR_MESSAGE
    );
    assert!(segments.hits_async().await >= 1);
    assert_eq!(combine.hits_async().await, 0);
}
