//! Bounded retry with exponential backoff for transient store errors.

use std::future::Future;
use tracing::warn;

use crate::metrics::STORE_RETRIES;

use super::config::RetryConfig;
use super::error::StoreError;

/// Runs a store operation with bounded retries.
///
/// Only transient errors are retried; permanent errors (not-found, access
/// denied, invalid location) are returned immediately. When attempts are
/// exhausted the last transient error is returned and the caller treats it
/// as fatal for the job.
pub async fn with_retry<T, F, Fut>(
    op: &'static str,
    retry: &RetryConfig,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < retry.max_attempts => {
                let delay = retry.delay_for_attempt(attempt);
                warn!(
                    op,
                    attempt,
                    max_attempts = retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient store error, retrying"
                );
                STORE_RETRIES.with_label_values(&[op]).inc();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreRef;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            multiplier: 2.0,
        }
    }

    fn transient() -> StoreError {
        StoreError::Unavailable {
            location: StoreRef::new("b", "k"),
            source: object_store::Error::Generic {
                store: "test",
                source: "boom".into(),
            },
        }
    }

    fn permanent() -> StoreError {
        StoreError::NotFound {
            location: StoreRef::new("b", "k"),
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retry("get", &fast_retry(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, StoreError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry("get", &fast_retry(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("put", &fast_retry(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("head", &fast_retry(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(permanent()) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), StoreError::NotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
