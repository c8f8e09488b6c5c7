//! Retrying caller - the single retry/timeout abstraction
//!
//! Every external backend call goes through [`call`]. This is the only
//! place in the codebase permitted to retry: callers above it must not
//! re-wrap retries, so policy and classification logic exist exactly once
//! and are testable independently of any specific backend.

use std::future::Future;
use std::time::Instant;

use rand::Rng;

use crate::application::ports::outbound::BackendError;
use crate::domain::value_objects::{BackendErrorKind, RetryPolicy};

/// Successful call outcome plus the attempts it consumed
#[derive(Debug)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// Terminal failure after classification and (possibly) retries
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} failure after {attempts} attempt(s): {last_error}")]
pub struct RetryFailure {
    pub kind: BackendErrorKind,
    pub attempts: u32,
    pub last_error: BackendError,
}

/// Execute `operation` under `policy`
///
/// Each attempt runs under the policy's per-attempt timeout; an elapsed
/// timeout is classified as [`BackendError::Timeout`]. Retryable failures
/// back off exponentially (`base * multiplier^attempt`, jittered) up to
/// `max_attempts`; non-retryable failures return after a single attempt.
/// One structured log event is emitted per attempt.
pub async fn call<T, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<Attempted<T>, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let started = Instant::now();
        let outcome = match tokio::time::timeout(policy.attempt_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(value) => {
                tracing::debug!(
                    call = label,
                    attempt,
                    latency_ms,
                    outcome = "success",
                    "backend call succeeded"
                );
                return Ok(Attempted { value, attempts: attempt });
            }
            Err(error) => {
                let kind = error.kind();
                let will_retry = policy.is_retryable(kind) && attempt < policy.max_attempts;
                tracing::warn!(
                    call = label,
                    attempt,
                    latency_ms,
                    outcome = %kind,
                    error = %error,
                    will_retry,
                    "backend call failed"
                );

                if !will_retry {
                    return Err(RetryFailure {
                        kind,
                        attempts: attempt,
                        last_error: error,
                    });
                }

                tokio::time::sleep(policy.backoff_for(attempt) + jitter(policy)).await;
            }
        }
    }
}

fn jitter(policy: &RetryPolicy) -> std::time::Duration {
    let max_ms = policy.max_jitter.as_millis() as u64;
    if max_ms == 0 {
        return std::time::Duration::ZERO;
    }
    std::time::Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_jitter: Duration::ZERO,
            attempt_timeout: Duration::from_millis(20),
            retryable: vec![
                BackendErrorKind::Timeout,
                BackendErrorKind::Connection,
                BackendErrorKind::RateLimited,
            ],
        }
    }

    #[tokio::test]
    async fn test_permanent_timeout_exhausts_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = call::<String, _, _>("test", &fast_policy(3), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Timeout)
            }
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.kind, BackendErrorKind::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_after_one_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = call::<String, _, _>("test", &fast_policy(5), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Auth("bad key".to_string()))
            }
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert_eq!(failure.kind, BackendErrorKind::Auth);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_validation_error_is_not_retried() {
        let result = call::<String, _, _>("test", &fast_policy(5), || async {
            Err(BackendError::Validation("bad payload".to_string()))
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = call("test", &fast_policy(5), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(BackendError::RateLimited)
                } else {
                    Ok("done".to_string())
                }
            }
        })
        .await;

        let done = result.unwrap();
        assert_eq!(done.value, "done");
        assert_eq!(done.attempts, 3);
    }

    #[tokio::test]
    async fn test_slow_operation_is_classified_as_timeout() {
        let result = call::<&str, _, _>("test", &fast_policy(2), || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok("too late")
        })
        .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.kind, BackendErrorKind::Timeout);
        assert_eq!(failure.attempts, 2);
    }
}
