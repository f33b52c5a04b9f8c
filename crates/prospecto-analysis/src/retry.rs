//! Back-off for the model call. Network failures, 429 and 5xx are retried;
//! everything else is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::AnalysisError;

const MAX_DELAY: Duration = Duration::from_secs(60);

pub(crate) fn is_transient(err: &AnalysisError) -> bool {
    let transient_status = |code: u16| code == 429 || (500..600).contains(&code);
    match err {
        AnalysisError::Http(e) if e.is_timeout() || e.is_connect() => true,
        AnalysisError::Http(e) => e.status().is_some_and(|s| transient_status(s.as_u16())),
        AnalysisError::UnexpectedStatus { status, .. } => transient_status(*status),
        _ => false,
    }
}

/// Delay before retry number `retry` (1-based): `base_ms` doubled per retry,
/// capped at a minute, then scaled by `jitter` (expected in `[0.75, 1.25)`).
fn backoff_delay(retry: u32, base_ms: u64, jitter: f64) -> Duration {
    let doubling = 1u64 << retry.saturating_sub(1).min(16);
    let nominal = Duration::from_millis(base_ms.saturating_mul(doubling)).min(MAX_DELAY);
    nominal.mul_f64(jitter)
}

/// Calls `attempt` once, then up to `max_retries` more times while it fails
/// with a transient error.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut attempt: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if retry == max_retries || !is_transient(&err) {
            return Err(err);
        }
        retry += 1;

        let delay = backoff_delay(retry, backoff_base_ms, 0.75 + rand::random::<f64>() * 0.5);
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "model request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
