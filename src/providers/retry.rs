//! Bounded exponential backoff for the buffered completion path.

use std::future::Future;
use std::time::Duration;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * 2^attempt`
/// between attempts (2s base gives 2s, 4s for three attempts).
///
/// Only errors the predicate marks transient are retried; anything else
/// aborts immediately. Exhausting the attempts returns `None` rather than an
/// error, so the caller can distinguish "provider unreachable" from a
/// provider-supplied degraded response.
pub async fn with_retry<T, E, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    for attempt in 0..max_attempts {
        match op().await {
            Ok(value) => return Some(value),
            Err(err) if !is_transient(&err) => {
                tracing::error!("Provider call failed with non-retryable error: {err}");
                return None;
            }
            Err(err) => {
                if attempt + 1 == max_attempts {
                    tracing::error!("Provider call failed after {max_attempts} attempts: {err}");
                    return None;
                }
                let delay = base_delay * 2u32.pow(attempt);
                tracing::warn!(
                    "Provider call failed (attempt {}/{max_attempts}), retrying in {:?}: {err}",
                    attempt + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    None
}
