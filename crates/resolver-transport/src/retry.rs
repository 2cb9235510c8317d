//! Caller-side retry with exponential backoff.
//!
//! The resolution driver treats a transport failure as terminal for the
//! current attempt. Callers that want retries wrap the whole attempt here.

use std::future::Future;

use anyhow::Result;
use executor_resolver_types::RetryConfig;
use tracing::debug;

/// Whether an error looks transient (rate limiting, timeouts, connection loss).
pub fn should_retry_error(error: &anyhow::Error) -> bool {
    let s = format!("{:#}", error).to_ascii_lowercase();
    s.contains("429")
        || s.contains("too many")
        || s.contains("timed out")
        || s.contains("timeout")
        || s.contains("connection")
        || s.contains("network error")
        || s.contains("transport")
}

/// Run `f` until it succeeds, fails with a non-transient error, or retries run out.
pub async fn with_retries<T, F, Fut>(retry: &RetryConfig, f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_when(retry, should_retry_error, f).await
}

/// [`with_retries`] over any error type, retrying only errors `is_retryable` accepts.
pub async fn retry_when<T, E, C, F, Fut>(
    retry: &RetryConfig,
    is_retryable: C,
    mut f: F,
) -> std::result::Result<T, E>
where
    E: std::fmt::Display,
    C: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let mut attempt = 0usize;
    let mut backoff = retry.initial_backoff;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= retry.retries || !is_retryable(&e) {
                    return Err(e);
                }
                attempt += 1;
                debug!(attempt, backoff_ms = backoff.as_millis() as u64, error = %e, "retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, retry.max_backoff);
            }
        }
    }
}
