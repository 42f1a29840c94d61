//! Bounded retry around pipeline steps.

use bridge_traits::http::RetryPolicy;
use std::future::Future;
use tracing::warn;

use crate::error::PipelineError;

/// Run `operation` until it succeeds, fails with a non-retryable error or the
/// policy's attempt budget is spent.
///
/// Delays follow [`RetryPolicy::delay_for_attempt`]. Errors for which
/// [`PipelineError::is_retryable`] is false are returned immediately.
pub async fn retry_pipeline<T, F, Fut>(
    policy: &RetryPolicy,
    step: &str,
    mut operation: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    step,
                    capture_id = %e.capture_id(),
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after error: {}",
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::CaptureId;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            use_exponential_backoff: true,
        }
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failure() {
        let id = CaptureId::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let value = retry_pipeline(&fast_policy(3), "download", || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(PipelineError::DownloadFailed {
                    capture_id: id,
                    message: "reset".into(),
                    transient: true,
                })
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let id = CaptureId::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = retry_pipeline(&fast_policy(3), "save", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::SaveFailed {
                capture_id: id,
                message: "disk full".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(PipelineError::SaveFailed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_content_is_not_retried() {
        let id = CaptureId::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = retry_pipeline(&fast_policy(5), "resolve", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::InvalidContent { capture_id: id })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_download_failure_is_not_retried() {
        let id = CaptureId::new();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = retry_pipeline(&fast_policy(3), "download", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::DownloadFailed {
                capture_id: id,
                message: "asset gone".into(),
                transient: false,
            })
        })
        .await;

        assert!(matches!(
            result,
            Err(PipelineError::DownloadFailed {
                transient: false,
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
