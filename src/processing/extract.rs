//! PDF text extraction.

use super::types::{Document, ExtractionError};
use async_trait::async_trait;

/// Turns document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract normalized text, consuming the document.
    async fn extract(&self, document: Document) -> Result<String, ExtractionError>;
}

/// Extractor for PDF documents backed by `pdf-extract`.
///
/// Parsing is CPU-bound and runs on the blocking pool; a panic inside the parser is reported
/// as [`ExtractionError::Unparseable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: Document) -> Result<String, ExtractionError> {
        if document.bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        let Document { key, bytes } = document;
        let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|join_error| {
                ExtractionError::Unparseable(format!("parser aborted: {join_error}"))
            })?
            .map_err(|error| ExtractionError::Unparseable(error.to_string()))?;

        let text = normalize_text(&raw);
        if text.trim().is_empty() {
            return Err(ExtractionError::NoText);
        }
        tracing::debug!(document = %key, chars = text.chars().count(), "Extracted document text");
        Ok(text)
    }
}

/// Replace tabs with spaces, page breaks with newlines, and drop other control characters.
pub(crate) fn normalize_text(raw: &str) -> String {
    raw.chars()
        .filter_map(|ch| match ch {
            '\t' => Some(' '),
            '\u{000C}' => Some('\n'),
            '\n' => Some('\n'),
            ch if ch.is_control() => None,
            ch => Some(ch),
        })
        .collect()
}
