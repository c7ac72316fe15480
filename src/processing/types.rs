//! Core data types and error definitions for the assist workflows.

use crate::{llm::LlmError, speech::SpeechError, storage::StorageError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Raw document fetched from storage, consumed by text extraction.
#[derive(Debug, Clone)]
pub struct Document {
    /// Storage key the document was fetched under.
    pub key: String,
    /// Undecoded file contents.
    pub bytes: Vec<u8>,
}

/// Errors produced while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Storage returned a zero-length blob.
    #[error("document is empty")]
    Empty,
    /// Bytes could not be parsed as a PDF.
    #[error("document could not be parsed: {0}")]
    Unparseable(String),
    /// Document parsed but contained no text.
    #[error("document contains no extractable text")]
    NoText,
}

/// Errors produced by invalid chunking parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Sizes must be positive with the overlap strictly below the segment size.
    #[error("invalid chunking parameters: max_size={max_size}, overlap={overlap}")]
    InvalidConfig {
        /// Requested maximum segment length.
        max_size: usize,
        /// Requested overlap between neighbours.
        overlap: usize,
    },
}

/// Errors raised by the per-segment and combine summarization steps.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Caller supplied no summaries to combine.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Language-model call failed.
    #[error(transparent)]
    Upstream(#[from] LlmError),
}

/// Workflow failures, all translated to the generic service error at the HTTP boundary.
#[derive(Debug, Error)]
pub enum AssistError {
    /// Referenced document is absent from storage.
    #[error("document '{0}' not found")]
    NotFound(String),
    /// Storage could not be read.
    #[error("failed to read from storage: {0}")]
    StorageRead(#[source] StorageError),
    /// Document text was unreadable.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Chunking parameters were invalid.
    #[error(transparent)]
    InvalidConfig(#[from] ChunkingError),
    /// Workflow received input it cannot process.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Document produced more segments than allowed.
    #[error("document needs more than {limit} segments")]
    DocumentTooLarge {
        /// Configured segment ceiling.
        limit: usize,
    },
    /// Language-model provider failed.
    #[error("language model failure: {0}")]
    Upstream(#[from] LlmError),
    /// Speech provider failed.
    #[error("speech synthesis failure: {0}")]
    Speech(#[from] SpeechError),
    /// Generated audio could not be uploaded.
    #[error("failed to upload to storage: {0}")]
    StorageWrite(#[source] StorageError),
    /// Local scratch file could not be written or read.
    #[error("scratch file error: {0}")]
    Scratch(#[source] std::io::Error),
    /// Workflow exceeded the request timeout.
    #[error("workflow exceeded {0:?}")]
    Timeout(Duration),
}

impl From<SummarizeError> for AssistError {
    fn from(error: SummarizeError) -> Self {
        match error {
            SummarizeError::InvalidInput(reason) => Self::InvalidInput(reason),
            SummarizeError::Upstream(inner) => Self::Upstream(inner),
        }
    }
}

/// Stages of one summarization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStage {
    /// Downloading the document.
    Fetching,
    /// Pulling text out of the document.
    Extracting,
    /// Splitting text into segments.
    Chunking,
    /// Summarizing segments.
    Summarizing,
    /// Merging segment summaries.
    Combining,
    /// Combined summary produced.
    Done,
}

impl fmt::Display for SummaryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Chunking => "chunking",
            Self::Summarizing => "summarizing",
            Self::Combining => "combining",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// Terminal failure of a summarization run, tagged with the stage it happened in.
#[derive(Debug, Error)]
#[error("summary failed while {stage}: {error}")]
pub struct SummaryFailure {
    /// Stage that was active when the run failed.
    pub stage: SummaryStage,
    /// Underlying cause.
    #[source]
    pub error: AssistError,
}

impl SummaryFailure {
    pub(crate) fn new(stage: SummaryStage, error: impl Into<AssistError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}
