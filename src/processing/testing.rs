//! In-memory collaborators for unit tests.

use super::extract::{TextExtractor, normalize_text};
use super::types::{Document, ExtractionError};
use crate::config::{
    Config, GeminiSettings, OpenAiSettings, SpeechSettings, StorageSettings, SummarySettings,
    UpstreamSettings,
};
use crate::llm::{LlmError, Prompt, TextGenerator};
use crate::speech::{SpeechError, SpeechSynthesizer};
use crate::storage::{BlobStore, StorageError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Reply {
    Echo,
    Fixed(String),
    FailWhen { marker: String, otherwise: String },
}

/// Text generator that records prompts and answers from a script.
pub(crate) struct ScriptedGenerator {
    reply: Reply,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Answer with the user message itself.
    pub(crate) fn echo() -> Arc<Self> {
        Self::with(Reply::Echo)
    }

    /// Always answer with `text`.
    pub(crate) fn fixed(text: &str) -> Arc<Self> {
        Self::with(Reply::Fixed(text.to_string()))
    }

    /// Fail with a server error when the prompt contains `marker`, else answer `otherwise`.
    pub(crate) fn fail_when(marker: &str, otherwise: &str) -> Arc<Self> {
        Self::with(Reply::FailWhen {
            marker: marker.to_string(),
            otherwise: otherwise.to_string(),
        })
    }

    /// User messages received so far.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .expect("prompt log")
            .push(prompt.user.clone());
        match &self.reply {
            Reply::Echo => Ok(prompt.user.clone()),
            Reply::Fixed(text) => Ok(text.clone()),
            Reply::FailWhen { marker, .. } if prompt.user.contains(marker.as_str()) => {
                Err(LlmError::UnexpectedStatus {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "scripted failure".into(),
                })
            }
            Reply::FailWhen { otherwise, .. } => Ok(otherwise.clone()),
        }
    }
}

/// Stored bytes and content type, keyed by `(container, key)`.
type Blobs = HashMap<(String, String), (Vec<u8>, String)>;

/// Blob store kept in a map keyed by `(container, key)`.
#[derive(Default)]
pub(crate) struct MemoryStore {
    blobs: Mutex<Blobs>,
}

impl MemoryStore {
    pub(crate) fn with_blob(container: &str, key: &str, data: &[u8]) -> Arc<Self> {
        let store = Self::default();
        store.blobs.lock().expect("blobs").insert(
            (container.to_string(), key.to_string()),
            (data.to_vec(), "application/pdf".to_string()),
        );
        Arc::new(store)
    }

    /// Stored bytes and content type for `(container, key)`.
    pub(crate) fn get(&self, container: &str, key: &str) -> Option<(Vec<u8>, String)> {
        self.blobs
            .lock()
            .expect("blobs")
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.blobs.lock().expect("blobs").len()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn fetch(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.get(container, key).map(|(bytes, _)| bytes))
    }

    async fn store(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.blobs.lock().expect("blobs").insert(
            (container.to_string(), key.to_string()),
            (data, content_type.to_string()),
        );
        Ok(())
    }
}

/// Extractor treating document bytes as UTF-8 text.
pub(crate) struct Utf8Extractor;

#[async_trait]
impl TextExtractor for Utf8Extractor {
    async fn extract(&self, document: Document) -> Result<String, ExtractionError> {
        if document.bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }
        let text = normalize_text(&String::from_utf8_lossy(&document.bytes));
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        Ok(text)
    }
}

/// Synthesizer returning the text bytes prefixed with a fake MP3 header.
pub(crate) struct EchoSpeech;

#[async_trait]
impl SpeechSynthesizer for EchoSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        Ok(audio)
    }
}

/// Configuration pointing at unreachable providers, with `scratch` as the audio scratch directory.
pub(crate) fn test_config(scratch: &Path) -> Config {
    Config {
        security_key: "test-secret".into(),
        openai: OpenAiSettings {
            api_key: "openai-key".into(),
            base_url: "http://127.0.0.1:9".into(),
            summary_model: "summary-model".into(),
            similarity_model: "similarity-model".into(),
            similarity_max_tokens: 256,
        },
        gemini: GeminiSettings {
            api_key: "gemini-key".into(),
            base_url: "http://127.0.0.1:9".into(),
            model: "heading-model".into(),
        },
        storage: StorageSettings {
            connection_string: "BlobEndpoint=http://127.0.0.1:9/acct;SharedAccessSignature=sv=1"
                .into(),
            document_container: "documents".into(),
            audio_container: "audio".into(),
        },
        speech: SpeechSettings {
            base_url: "http://127.0.0.1:9".into(),
            language: "en".into(),
            scratch_dir: scratch.to_path_buf(),
        },
        summary: SummarySettings::default(),
        upstream: UpstreamSettings {
            timeout: Duration::from_secs(5),
            max_retries: 0,
        },
        request_timeout: Duration::from_secs(30),
        server_port: None,
    }
}
