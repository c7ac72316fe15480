//! Document summarization run: fetch, extract, chunk, summarize segments, combine.

use super::chunking::{ChunkConfig, Segment};
use super::extract::TextExtractor;
use super::summarize::{Combiner, SegmentSummarizer, SegmentSummary};
use super::types::{AssistError, Document, SummaryFailure, SummaryStage};
use crate::config::SummarySettings;
use crate::llm::TextGenerator;
use crate::storage::BlobStore;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

/// Map-reduce summarizer for stored documents.
///
/// Each run owns its intermediate state; the pipeline itself only holds shared, immutable
/// collaborators and can serve concurrent requests.
pub struct SummaryPipeline {
    store: Arc<dyn BlobStore>,
    container: String,
    extractor: Arc<dyn TextExtractor>,
    summarizer: SegmentSummarizer,
    combiner: Combiner,
    settings: SummarySettings,
}

impl SummaryPipeline {
    /// Pipeline reading documents from `container` and summarizing with `llm`.
    pub fn new(
        store: Arc<dyn BlobStore>,
        container: impl Into<String>,
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn TextGenerator>,
        settings: SummarySettings,
    ) -> Self {
        Self {
            store,
            container: container.into(),
            extractor,
            summarizer: SegmentSummarizer::new(llm.clone()),
            combiner: Combiner::new(llm, settings.combine_max_chars),
            settings,
        }
    }

    /// Summarize the document stored under `file_name`.
    ///
    /// Either every segment is summarized and combined, or the run fails with the stage it
    /// was in; no partial summary is ever returned.
    pub async fn run(&self, file_name: &str) -> Result<String, SummaryFailure> {
        let stage = enter(file_name, SummaryStage::Fetching);
        let bytes = match self.store.fetch(&self.container, file_name).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Err(SummaryFailure::new(
                    stage,
                    AssistError::NotFound(file_name.to_string()),
                ));
            }
            Err(error) => return Err(SummaryFailure::new(stage, AssistError::StorageRead(error))),
        };

        let stage = enter(file_name, SummaryStage::Extracting);
        let document = Document {
            key: file_name.to_string(),
            bytes,
        };
        let text = self
            .extractor
            .extract(document)
            .await
            .map_err(|error| SummaryFailure::new(stage, error))?;

        let stage = enter(file_name, SummaryStage::Chunking);
        let segments = self
            .segment(&text)
            .map_err(|error| SummaryFailure::new(stage, error))?;

        let stage = enter(file_name, SummaryStage::Summarizing);
        let pending: Vec<_> = segments
            .iter()
            .map(|segment| self.summarizer.summarize(segment))
            .collect();
        let summaries: Vec<SegmentSummary> = stream::iter(pending)
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await
            .map_err(|error| SummaryFailure::new(stage, error))?;

        let stage = enter(file_name, SummaryStage::Combining);
        let summary = self
            .combiner
            .combine(&summaries)
            .await
            .map_err(|error| SummaryFailure::new(stage, error))?;

        enter(file_name, SummaryStage::Done);
        tracing::info!(
            document = file_name,
            segments = summaries.len(),
            chars = summary.chars().count(),
            "Document summarized"
        );
        Ok(summary)
    }

    fn segment<'a>(&self, text: &'a str) -> Result<Vec<Segment<'a>>, AssistError> {
        let config = ChunkConfig::new(self.settings.chunk_size, self.settings.chunk_overlap)?;
        let limit = self.settings.max_segments;
        let segments: Vec<_> = config
            .segments(text)
            .take(limit.saturating_add(1))
            .collect();
        if segments.len() > limit {
            return Err(AssistError::DocumentTooLarge { limit });
        }
        tracing::debug!(
            segments = segments.len(),
            chunk_size = config.max_size(),
            overlap = config.overlap(),
            "Chunked document text"
        );
        Ok(segments)
    }
}

fn enter(file_name: &str, stage: SummaryStage) -> SummaryStage {
    tracing::debug!(document = file_name, %stage, "Summary stage");
    stage
}
