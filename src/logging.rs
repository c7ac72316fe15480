//! Tracing setup and per-request spans.
//!
//! Events go to stdout in compact form and are mirrored, without ANSI colours, to a log file:
//! `DOCSCRIBE_LOG_FILE` when set, otherwise a daily-rolled `logs/docscribe.log`. Requests
//! run inside [`request_span`] so every line carries the route and a request id.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Span;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use uuid::Uuid;

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogFile {
    /// Explicit path supplied through `DOCSCRIBE_LOG_FILE`.
    Explicit(PathBuf),
    /// Daily-rolled file under `logs/`.
    Rolling,
}

impl LogFile {
    fn from_env() -> Self {
        match std::env::var("DOCSCRIBE_LOG_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::Explicit(PathBuf::from(path)),
            _ => Self::Rolling,
        }
    }

    fn open(&self) -> Option<NonBlocking> {
        let (writer, guard) = match self {
            Self::Explicit(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
                    .ok()?;
                tracing_appender::non_blocking(file)
            }
            Self::Rolling => {
                std::fs::create_dir_all("logs")
                    .map_err(|err| eprintln!("Failed to create logs directory: {err}"))
                    .ok()?;
                tracing_appender::non_blocking(tracing_appender::rolling::daily(
                    "logs",
                    "docscribe.log",
                ))
            }
        };
        let _ = FILE_GUARD.set(guard);
        Some(writer)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering and defaults to `info`. The file layer is skipped when the
/// target cannot be opened.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = LogFile::from_env().open().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

/// Span wrapping one HTTP request, tagged with the route and a fresh request id.
pub fn request_span(route: &str) -> Span {
    tracing::info_span!("request", route, request_id = %Uuid::new_v4())
}
