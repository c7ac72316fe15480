//! Bounded retry with exponential backoff for upstream calls.

use crate::config::UpstreamSettings;
use std::future::Future;
use std::time::Duration;

const BASE_DELAY: Duration = Duration::from_millis(500);

/// Errors that can tell whether another attempt is worthwhile.
pub trait Transient {
    /// `true` for timeouts, transport failures, throttling, and server-side errors.
    fn is_transient(&self) -> bool;
}

/// Retry schedule for one upstream operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts made after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1 << retry.min(16))
    }
}

impl From<&UpstreamSettings> for RetryPolicy {
    fn from(settings: &UpstreamSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_delay: BASE_DELAY,
        }
    }
}

/// Run `call` until it succeeds, fails permanently, or the retry budget is spent.
pub async fn with_retry<T, E, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut call: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    operation,
                    attempt = retry + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient upstream failure; retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
