//! Assist workflows coordinating the language models, speech engine, and blob storage.

use crate::{
    config::Config,
    llm::{GeminiClient, LlmError, OpenAiChatClient, TextGenerator},
    processing::{
        extract::{PdfTextExtractor, TextExtractor},
        pipeline::SummaryPipeline,
        prompts,
        sanitize::{clean_heading, strip_speech_markup},
        types::AssistError,
    },
    speech::{GoogleTranslateTts, SpeechSynthesizer},
    storage::{AzureBlobClient, BlobStore},
};
use anyhow::Context;
use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Workflows exposed to the HTTP surface.
#[async_trait]
pub trait AssistApi: Send + Sync {
    /// Generate a short heading for `paragraph`.
    async fn generate_heading(&self, paragraph: &str) -> Result<String, AssistError>;

    /// Describe the content `first` and `second` have in common.
    async fn find_similar_text(&self, first: &str, second: &str) -> Result<String, AssistError>;

    /// Synthesize `text` and upload the audio as `file_name`, returning the stored name.
    async fn synthesize_speech(&self, text: &str, file_name: &str) -> Result<String, AssistError>;

    /// Summarize the stored PDF `file_name`.
    async fn summarize_document(&self, file_name: &str) -> Result<String, AssistError>;
}

/// External collaborators the workflows delegate to.
pub struct Collaborators {
    /// Model generating paragraph headings.
    pub heading: Arc<dyn TextGenerator>,
    /// Model detecting shared content between paragraphs.
    pub similarity: Arc<dyn TextGenerator>,
    /// Model summarizing segments and merging summaries.
    pub summary: Arc<dyn TextGenerator>,
    /// Text-to-speech engine.
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Blob storage for documents and generated audio.
    pub store: Arc<dyn BlobStore>,
    /// Text extraction for stored documents.
    pub extractor: Arc<dyn TextExtractor>,
}

/// Default [`AssistApi`] implementation.
///
/// Built once at start-up and shared behind an `Arc`; holds no per-request state.
pub struct AssistService {
    heading: Arc<dyn TextGenerator>,
    similarity: Arc<dyn TextGenerator>,
    speech: Arc<dyn SpeechSynthesizer>,
    store: Arc<dyn BlobStore>,
    audio_container: String,
    scratch_dir: PathBuf,
    pipeline: SummaryPipeline,
    request_timeout: Duration,
}

impl AssistService {
    /// Assemble the service from explicit collaborators.
    pub fn new(collaborators: Collaborators, config: &Config) -> Self {
        let Collaborators {
            heading,
            similarity,
            summary,
            speech,
            store,
            extractor,
        } = collaborators;
        let pipeline = SummaryPipeline::new(
            store.clone(),
            config.storage.document_container.clone(),
            extractor,
            summary,
            config.summary,
        );

        Self {
            heading,
            similarity,
            speech,
            store,
            audio_container: config.storage.audio_container.clone(),
            scratch_dir: config.speech.scratch_dir.clone(),
            pipeline,
            request_timeout: config.request_timeout,
        }
    }

    /// Build the production adapters described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.speech.scratch_dir).with_context(|| {
            format!(
                "creating scratch directory {}",
                config.speech.scratch_dir.display()
            )
        })?;

        let heading = GeminiClient::new(&config.gemini, &config.upstream)
            .context("initializing heading model")?;
        let similarity = OpenAiChatClient::new(
            &config.openai,
            &config.upstream,
            config.openai.similarity_model.clone(),
        )
        .context("initializing similarity model")?
        .with_max_tokens(config.openai.similarity_max_tokens);
        let summary = OpenAiChatClient::new(
            &config.openai,
            &config.upstream,
            config.openai.summary_model.clone(),
        )
        .context("initializing summary model")?;
        let speech = GoogleTranslateTts::new(&config.speech, &config.upstream)
            .context("initializing speech synthesizer")?;
        let store = AzureBlobClient::new(&config.storage, &config.upstream)
            .context("initializing blob storage")?;
        tracing::info!(
            heading_model = %config.gemini.model,
            similarity_model = %config.openai.similarity_model,
            summary_model = %config.openai.summary_model,
            "Assist collaborators initialized"
        );

        Ok(Self::new(
            Collaborators {
                heading: Arc::new(heading),
                similarity: Arc::new(similarity),
                summary: Arc::new(summary),
                speech: Arc::new(speech),
                store: Arc::new(store),
                extractor: Arc::new(PdfTextExtractor),
            },
            config,
        ))
    }

    async fn bounded<T>(
        &self,
        workflow: &'static str,
        run: impl Future<Output = Result<T, AssistError>>,
    ) -> Result<T, AssistError> {
        match tokio::time::timeout(self.request_timeout, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(workflow, timeout = ?self.request_timeout, "Workflow timed out");
                Err(AssistError::Timeout(self.request_timeout))
            }
        }
    }

    /// Synthesize `text`, stage the audio as a file in the scratch directory, and upload the
    /// staged file's contents. Nothing is uploaded unless the audio was written to disk.
    async fn speak(&self, text: &str, file_name: &str) -> Result<String, AssistError> {
        let audio = self.speech.synthesize(&strip_speech_markup(text)).await?;

        // Removed when dropped, including on cancellation.
        let scratch = tempfile::Builder::new()
            .prefix("speech-")
            .suffix(".mp3")
            .tempfile_in(&self.scratch_dir)
            .map_err(AssistError::Scratch)?;
        tokio::fs::write(scratch.path(), &audio)
            .await
            .map_err(AssistError::Scratch)?;
        let payload = tokio::fs::read(scratch.path())
            .await
            .map_err(AssistError::Scratch)?;

        self.store
            .store(&self.audio_container, file_name, payload, "audio/mpeg")
            .await
            .map_err(AssistError::StorageWrite)?;
        tracing::info!(
            file_name,
            container = %self.audio_container,
            bytes = audio.len(),
            "Uploaded synthesized speech"
        );
        Ok(file_name.to_string())
    }
}

#[async_trait]
impl AssistApi for AssistService {
    async fn generate_heading(&self, paragraph: &str) -> Result<String, AssistError> {
        self.bounded("heading", async {
            let raw = self.heading.generate(&prompts::heading(paragraph)).await?;
            let heading = clean_heading(&raw);
            if heading.is_empty() {
                return Err(AssistError::Upstream(LlmError::InvalidResponse(
                    "heading was empty after clean-up".into(),
                )));
            }
            Ok(heading)
        })
        .await
    }

    async fn find_similar_text(&self, first: &str, second: &str) -> Result<String, AssistError> {
        self.bounded("similarity", async {
            Ok(self
                .similarity
                .generate(&prompts::similarity(first, second))
                .await?)
        })
        .await
    }

    async fn synthesize_speech(&self, text: &str, file_name: &str) -> Result<String, AssistError> {
        self.bounded("speech", self.speak(text, file_name)).await
    }

    async fn summarize_document(&self, file_name: &str) -> Result<String, AssistError> {
        self.bounded("summary", async {
            self.pipeline.run(file_name).await.map_err(|failure| {
                tracing::warn!(
                    document = file_name,
                    stage = %failure.stage,
                    error = %failure.error,
                    "Summary run failed"
                );
                failure.error
            })
        })
        .await
    }
}
