//! Text-to-speech capability backed by the Google Translate TTS endpoint.
//!
//! The endpoint accepts at most 100 characters per request, so text is split at whitespace
//! into pieces below that limit and the returned MP3 frames are concatenated in order.

use crate::config::{SpeechSettings, UpstreamSettings};
use crate::retry::{RetryPolicy, Transient, with_retry};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

const MAX_PIECE_CHARS: usize = 100;

/// Errors raised while synthesizing speech.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Nothing speakable was left after normalization.
    #[error("no text to synthesize")]
    EmptyText,
    /// Provider could not be reached.
    #[error("TTS provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Request exceeded the configured upstream timeout.
    #[error("TTS request timed out")]
    Timeout,
    /// Provider answered with a non-success status.
    #[error("TTS provider returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code reported by the provider.
        status: StatusCode,
        /// Raw response body for diagnostics.
        body: String,
    },
}

impl Transient for SpeechError {
    fn is_transient(&self) -> bool {
        match self {
            Self::ProviderUnavailable(_) | Self::Timeout => true,
            Self::UnexpectedStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::EmptyText => false,
        }
    }
}

/// Interface implemented by speech synthesis backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` to MP3 audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Client for the translate TTS endpoint.
pub struct GoogleTranslateTts {
    http: Client,
    base_url: String,
    language: String,
    retry: RetryPolicy,
}

impl GoogleTranslateTts {
    /// Build a synthesizer from speech settings.
    pub fn new(
        settings: &SpeechSettings,
        upstream: &UpstreamSettings,
    ) -> Result<Self, SpeechError> {
        let http = Client::builder()
            .user_agent("docscribe/tts")
            .timeout(upstream.timeout)
            .build()
            .map_err(|error| SpeechError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.clone(),
            language: settings.language.clone(),
            retry: RetryPolicy::from(upstream),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/translate_tts", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_piece(
        &self,
        piece: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = piece.chars().count().to_string();
        let response = self
            .http
            .get(self.endpoint())
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", piece),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    SpeechError::Timeout
                } else {
                    SpeechError::ProviderUnavailable(error.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::UnexpectedStatus { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| SpeechError::ProviderUnavailable(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let pieces = split_for_tts(text, MAX_PIECE_CHARS);
        if pieces.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let total = pieces.len();
        let mut audio = Vec::new();
        for (idx, piece) in pieces.iter().enumerate() {
            let frames = with_retry(self.retry, "tts.piece", || {
                self.fetch_piece(piece, idx, total)
            })
            .await?;
            audio.extend_from_slice(&frames);
        }
        tracing::debug!(pieces = total, bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}

/// Split text into whitespace-delimited pieces of at most `limit` characters.
///
/// Words longer than `limit` are broken at character boundaries.
fn split_for_tts(text: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > limit {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(
                chars
                    .chunks(limit)
                    .map(|chunk| chunk.iter().collect::<String>()),
            );
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            word_len + 1
        };
        if current_len + needed > limit {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
