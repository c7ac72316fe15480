#![deny(missing_docs)]

//! Core library for the docscribe HTTP gateway.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text-generation providers.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Assist workflows and the document summarization pipeline.
pub mod processing;
/// Retry policy for upstream calls.
pub mod retry;
/// Speech synthesis provider.
pub mod speech;
/// Blob storage provider.
pub mod storage;
