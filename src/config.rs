use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TTS_BASE_URL: &str = "https://translate.google.com";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docscribe server.
///
/// Loaded once at process start and shared read-only with every component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret expected verbatim in the `Authorization` header.
    pub security_key: String,
    /// Hosted chat-completions settings (similarity and summaries).
    pub openai: OpenAiSettings,
    /// Generative-language settings (headings).
    pub gemini: GeminiSettings,
    /// Blob storage connection and container names.
    pub storage: StorageSettings,
    /// Text-to-speech settings.
    pub speech: SpeechSettings,
    /// Map-reduce summarization tuning.
    pub summary: SummarySettings,
    /// Timeout and retry policy applied to upstream calls.
    pub upstream: UpstreamSettings,
    /// Upper bound for a whole workflow run.
    pub request_timeout: Duration,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Settings for the chat-completions provider.
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    /// Model used for the per-segment and combine summarization calls.
    pub summary_model: String,
    /// Model used for paragraph similarity detection.
    pub similarity_model: String,
    /// Completion token cap for similarity detection.
    pub similarity_max_tokens: u32,
}

/// Settings for the generative-language provider.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// API key passed as the `key` query parameter.
    pub api_key: String,
    /// Base URL up to and including the API version segment.
    pub base_url: String,
    /// Model used for heading generation.
    pub model: String,
}

/// Settings for the blob storage collaborator.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Raw storage connection string.
    pub connection_string: String,
    /// Container holding uploaded PDF documents.
    pub document_container: String,
    /// Container receiving generated audio.
    pub audio_container: String,
}

/// Settings for speech synthesis.
#[derive(Debug, Clone)]
pub struct SpeechSettings {
    /// Base URL of the translate TTS endpoint.
    pub base_url: String,
    /// Language tag passed to the synthesizer.
    pub language: String,
    /// Scratch directory for temporary audio files.
    pub scratch_dir: PathBuf,
}

/// Chunking and fan-out settings for document summaries.
#[derive(Debug, Clone, Copy)]
pub struct SummarySettings {
    /// Maximum segment length in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent segments.
    pub chunk_overlap: usize,
    /// Maximum number of segments accepted for one document.
    pub max_segments: usize,
    /// Number of segment summaries requested concurrently.
    pub concurrency: usize,
    /// Character budget for the text handed to a single combine call.
    pub combine_max_chars: usize,
}

/// Timeout and retry policy for upstream HTTP calls.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamSettings {
    /// Per-call HTTP timeout.
    pub timeout: Duration,
    /// Retries attempted after the first failure of a transient error.
    pub max_retries: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            chunk_size: 7000,
            chunk_overlap: 150,
            max_segments: 64,
            concurrency: 4,
            combine_max_chars: 12_000,
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let summary_defaults = SummarySettings::default();
        let upstream_defaults = UpstreamSettings::default();

        let summary = SummarySettings {
            chunk_size: parse_or("SUMMARY_CHUNK_SIZE", summary_defaults.chunk_size)?,
            chunk_overlap: parse_or("SUMMARY_CHUNK_OVERLAP", summary_defaults.chunk_overlap)?,
            max_segments: parse_or("SUMMARY_MAX_SEGMENTS", summary_defaults.max_segments)?,
            concurrency: parse_or("SUMMARY_CONCURRENCY", summary_defaults.concurrency)?,
            combine_max_chars: parse_or(
                "SUMMARY_COMBINE_MAX_CHARS",
                summary_defaults.combine_max_chars,
            )?,
        };
        if summary.chunk_overlap == 0 || summary.chunk_overlap >= summary.chunk_size {
            return Err(ConfigError::InvalidValue(
                "SUMMARY_CHUNK_OVERLAP must be positive and smaller than SUMMARY_CHUNK_SIZE".into(),
            ));
        }
        nonzero("SUMMARY_MAX_SEGMENTS", summary.max_segments)?;
        nonzero("SUMMARY_CONCURRENCY", summary.concurrency)?;

        let upstream_timeout =
            timeout_secs("UPSTREAM_TIMEOUT_SECS", upstream_defaults.timeout.as_secs())?;
        let request_timeout = timeout_secs("REQUEST_TIMEOUT_SECS", 300)?;

        Ok(Self {
            security_key: load_env("SECURITY_KEY")?,
            openai: OpenAiSettings {
                api_key: load_env("OPENAI_API_KEY")?,
                base_url: load_env_optional("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                summary_model: load_env_optional("OPENAI_SUMMARY_MODEL")
                    .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
                similarity_model: load_env_optional("OPENAI_SIMILARITY_MODEL")
                    .unwrap_or_else(|| "gpt-4o".to_string()),
                similarity_max_tokens: parse_or("OPENAI_SIMILARITY_MAX_TOKENS", 2000)?,
            },
            gemini: GeminiSettings {
                api_key: load_env("GOOGLE_API_KEY")?,
                base_url: load_env_optional("GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                model: load_env_optional("GEMINI_MODEL")
                    .unwrap_or_else(|| "gemini-pro".to_string()),
            },
            storage: StorageSettings {
                connection_string: load_env("AZURE_STORAGE_CONNECTION_STRING")?,
                document_container: load_env("AZURE_CONTAINER_NAME")?,
                audio_container: load_env("AZURE_CONTAINER_NAME_AUDIO_SUMMARY")?,
            },
            speech: SpeechSettings {
                base_url: load_env_optional("TTS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_TTS_BASE_URL.to_string()),
                language: load_env_optional("TTS_LANGUAGE").unwrap_or_else(|| "en".to_string()),
                scratch_dir: load_env_optional("AUDIO_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(env::temp_dir),
            },
            summary,
            upstream: UpstreamSettings {
                timeout: upstream_timeout,
                max_retries: parse_or("UPSTREAM_MAX_RETRIES", upstream_defaults.max_retries)?,
            },
            request_timeout,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn nonzero<T: PartialEq + Default>(key: &str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::InvalidValue(format!(
            "{key} must be greater than zero"
        )));
    }
    Ok(value)
}

fn timeout_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    nonzero(key, parse_or(key, default)?).map(Duration::from_secs)
}

/// Load `.env` (when present) and build the configuration from the process environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    Config::from_env()
}

impl Config {
    /// Emit the non-secret settings at debug level. Call once tracing is installed.
    pub fn log_summary(&self) {
        tracing::debug!(
            openai_base_url = %self.openai.base_url,
            gemini_model = %self.gemini.model,
            document_container = %self.storage.document_container,
            audio_container = %self.storage.audio_container,
            chunk_size = self.summary.chunk_size,
            chunk_overlap = self.summary.chunk_overlap,
            server_port = ?self.server_port,
            "Loaded configuration"
        );
    }
}
