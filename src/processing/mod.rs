//! Assist workflows: heading, similarity, speech, and map-reduce document summaries.

pub mod chunking;
pub mod extract;
mod pipeline;
pub mod prompts;
pub mod sanitize;
mod service;
pub mod summarize;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use pipeline::SummaryPipeline;
pub use service::{AssistApi, AssistService, Collaborators};
pub use types::{
    AssistError, ChunkingError, Document, ExtractionError, SummarizeError, SummaryFailure,
    SummaryStage,
};
