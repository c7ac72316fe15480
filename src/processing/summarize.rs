//! Map and combine steps of document summarization.

use super::chunking::Segment;
use super::prompts;
use super::types::SummarizeError;
use crate::llm::TextGenerator;
use futures_util::future::try_join_all;
use std::sync::Arc;

const SUMMARY_SEPARATOR: &str = "\n\n";

/// Summary of one segment, tagged with the segment's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    /// Index of the summarized segment.
    pub index: usize,
    /// Summary text.
    pub text: String,
}

/// Summarizes individual segments. Holds no mutable state, so calls may run concurrently.
#[derive(Clone)]
pub struct SegmentSummarizer {
    llm: Arc<dyn TextGenerator>,
}

impl SegmentSummarizer {
    /// Summarizer backed by `llm`.
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Summarize one segment.
    pub async fn summarize(&self, segment: &Segment<'_>) -> Result<SegmentSummary, SummarizeError> {
        let text = self.llm.generate(&prompts::segment(segment.text)).await?;
        tracing::debug!(
            segment = segment.index,
            chars = text.len(),
            "Segment summarized"
        );
        Ok(SegmentSummary {
            index: segment.index,
            text,
        })
    }
}

/// Merges segment summaries into the final summary.
///
/// When the joined summaries exceed the character budget they are first collapsed: grouped
/// into consecutive batches under the budget, each batch merged, repeated until they fit or no
/// batch can absorb more than one summary.
#[derive(Clone)]
pub struct Combiner {
    llm: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl Combiner {
    /// Combiner backed by `llm` with a per-call input budget in characters.
    pub fn new(llm: Arc<dyn TextGenerator>, max_input_chars: usize) -> Self {
        Self {
            llm,
            max_input_chars: max_input_chars.max(1),
        }
    }

    /// Merge `summaries`, in segment order, into one summary.
    pub async fn combine(&self, summaries: &[SegmentSummary]) -> Result<String, SummarizeError> {
        if summaries.is_empty() {
            return Err(SummarizeError::InvalidInput(
                "at least one segment summary is required".into(),
            ));
        }

        let mut ordered: Vec<&SegmentSummary> = summaries.iter().collect();
        ordered.sort_by_key(|summary| summary.index);
        let mut texts: Vec<String> = ordered.into_iter().map(|s| s.text.clone()).collect();

        while texts.len() > 1 && joined_chars(&texts) > self.max_input_chars {
            let batches = batch_by_budget(&texts, self.max_input_chars);
            if batches.len() == texts.len() {
                break;
            }
            tracing::debug!(
                inputs = texts.len(),
                batches = batches.len(),
                "Collapsing summaries before final combine"
            );
            texts = try_join_all(
                batches
                    .iter()
                    .map(|batch| self.merge(batch.join(SUMMARY_SEPARATOR))),
            )
            .await?;
        }

        self.merge(texts.join(SUMMARY_SEPARATOR)).await
    }

    async fn merge(&self, joined: String) -> Result<String, SummarizeError> {
        Ok(self.llm.generate(&prompts::combine(&joined)).await?)
    }
}

fn joined_chars(texts: &[String]) -> usize {
    let content: usize = texts.iter().map(|text| text.chars().count()).sum();
    content + SUMMARY_SEPARATOR.len() * texts.len().saturating_sub(1)
}

/// Group consecutive texts so each group's joined length stays within `budget`.
///
/// A text longer than the budget forms a group on its own.
fn batch_by_budget(texts: &[String], budget: usize) -> Vec<Vec<&str>> {
    let mut batches: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_chars = 0;

    for text in texts {
        let chars = text.chars().count();
        let added = if current.is_empty() {
            chars
        } else {
            chars + SUMMARY_SEPARATOR.len()
        };
        if !current.is_empty() && current_chars + added > budget {
            batches.push(std::mem::take(&mut current));
            current_chars = 0;
            current.push(text);
            current_chars += chars;
            continue;
        }
        current.push(text);
        current_chars += added;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
