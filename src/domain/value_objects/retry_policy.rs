//! Retry policy configuration for external backend calls
//!
//! A `RetryPolicy` is a configuration value, never mutated at runtime.
//! Each backend type (text, image, audio) gets its own policy; the
//! per-stage worst case is `attempts * (timeout + backoff)`, which gives
//! the orchestrator a computable end-to-end latency ceiling.

use std::time::Duration;

/// Classification of a backend failure, used to decide retryability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    Timeout,
    Connection,
    RateLimited,
    Auth,
    Validation,
    /// Unclassified upstream error (5xx bodies, malformed payloads)
    Api,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::RateLimited => "rate_limited",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::Api => "api",
        }
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempt count, backoff shape and per-attempt timeout for one call type
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    /// Backoff before the second attempt
    pub base_backoff: Duration,
    /// Multiplier applied per subsequent attempt
    pub backoff_multiplier: f64,
    /// Upper bound on the random jitter added to each backoff
    pub max_jitter: Duration,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    /// Error kinds that trigger another attempt
    pub retryable: Vec<BackendErrorKind>,
}

impl RetryPolicy {
    /// Default policy for the text backend (latency tens of seconds)
    pub fn text_default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(30),
            retryable: Self::default_retryable(),
        }
    }

    /// Default policy for the image backend (slower per attempt than text)
    pub fn image_default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(60),
            retryable: Self::default_retryable(),
        }
    }

    /// Default policy for the audio backend
    pub fn audio_default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            max_jitter: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(30),
            retryable: Self::default_retryable(),
        }
    }

    fn default_retryable() -> Vec<BackendErrorKind> {
        vec![
            BackendErrorKind::Timeout,
            BackendErrorKind::Connection,
            BackendErrorKind::RateLimited,
        ]
    }

    pub fn is_retryable(&self, kind: BackendErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Backoff delay before the attempt following `completed_attempts`
    /// failures, jitter excluded
    pub fn backoff_for(&self, completed_attempts: u32) -> Duration {
        let exponent = completed_attempts.saturating_sub(1);
        let factor = self.backoff_multiplier.powi(exponent as i32);
        self.base_backoff.mul_f64(factor)
    }

    /// Worst-case wall-clock time for a call under this policy:
    /// every attempt times out and every backoff (jitter included) is paid
    pub fn worst_case_latency(&self) -> Duration {
        let mut total = Duration::ZERO;
        for attempt in 1..=self.max_attempts {
            total += self.attempt_timeout;
            if attempt < self.max_attempts {
                total += self.backoff_for(attempt) + self.max_jitter;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_jitter: Duration::ZERO,
            attempt_timeout: Duration::from_secs(1),
            retryable: vec![BackendErrorKind::Timeout, BackendErrorKind::RateLimited],
        }
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = policy(4);
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_worst_case_latency_is_computable() {
        let policy = policy(3);
        // 3 timeouts plus backoffs after attempts 1 and 2
        let expected = Duration::from_secs(3) + Duration::from_millis(100 + 200);
        assert_eq!(policy.worst_case_latency(), expected);
    }

    #[test]
    fn test_retryable_set_membership() {
        let policy = policy(3);
        assert!(policy.is_retryable(BackendErrorKind::Timeout));
        assert!(policy.is_retryable(BackendErrorKind::RateLimited));
        assert!(!policy.is_retryable(BackendErrorKind::Auth));
        assert!(!policy.is_retryable(BackendErrorKind::Validation));
    }
}
