//! Bounded retry policy for backend calls.
//!
//! The policy is stateless: it answers "how long to wait before attempt `n`"
//! and "is this error worth another attempt". The loop that uses it lives in
//! [`RetryingBackend`](super::RetryingBackend).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Default number of attempts per backend call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling on any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

type DelayFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Attempt cap plus a delay function keyed by retry index.
///
/// `delay_for(1)` is the wait before the second attempt, `delay_for(2)` the
/// wait before the third, and so on.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Arc<DelayFn>,
}

impl RetryPolicy {
    /// Exponential backoff: `base * 2^(retry - 1)`, capped at `cap`.
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - Total attempts including the first (minimum 1)
    /// * `base` - Delay before the first retry
    /// * `cap` - Upper bound for any single delay
    pub fn exponential(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self::with_delay_fn(max_attempts, move |retry| {
            let exponent = retry.saturating_sub(1).min(16);
            base.saturating_mul(1u32 << exponent).min(cap)
        })
    }

    /// Same delay before every retry.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::with_delay_fn(max_attempts, move |_| delay)
    }

    /// No waiting between attempts. Used by tests and offline backends.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }

    /// Custom delay function.
    pub fn with_delay_fn<F>(max_attempts: u32, delay: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Arc::new(delay),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        (self.delay)(retry)
    }

    /// Whether another attempt should follow a failed attempt number
    /// `attempt` (1-based) that ended with `error`.
    pub fn should_retry(&self, attempt: u32, error: &LlmError) -> bool {
        attempt < self.max_attempts && is_transient_error(error)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("first_delay", &self.delay_for(1))
            .finish()
    }
}

/// Check if an error is transient and should be retried.
pub fn is_transient_error(error: &LlmError) -> bool {
    match error {
        LlmError::Timeout(_) | LlmError::RateLimited(_) => true,
        LlmError::RequestFailed(msg) => {
            let lower = msg.to_lowercase();
            lower.contains("timeout")
                || lower.contains("timed out")
                || lower.contains("connection")
                || lower.contains("temporarily")
        }
        LlmError::ApiError { code, .. } => *code >= 500 || *code == 429,
        LlmError::MissingApiKey | LlmError::ParseError(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(10), Duration::from_secs(30));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::immediate(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_for(1), Duration::ZERO);
    }

    #[test]
    fn test_should_retry_respects_cap_and_kind() {
        let policy = RetryPolicy::immediate(2);
        let timeout = LlmError::Timeout("slow".to_string());
        let bad_request = LlmError::ApiError {
            code: 400,
            message: "Bad request".to_string(),
        };

        assert!(policy.should_retry(1, &timeout));
        assert!(!policy.should_retry(2, &timeout));
        assert!(!policy.should_retry(1, &bad_request));
    }

    #[test]
    fn test_custom_delay_fn() {
        let policy = RetryPolicy::with_delay_fn(4, |retry| Duration::from_millis(retry as u64 * 10));
        assert_eq!(policy.delay_for(3), Duration::from_millis(30));
    }

    #[test]
    fn test_is_transient_error_rate_limited() {
        let error = LlmError::RateLimited("Too many requests".to_string());
        assert!(is_transient_error(&error));
    }

    #[test]
    fn test_is_transient_error_server_error() {
        let error = LlmError::ApiError {
            code: 503,
            message: "Service unavailable".to_string(),
        };
        assert!(is_transient_error(&error));
    }

    #[test]
    fn test_is_transient_error_connection() {
        let error = LlmError::RequestFailed("Connection refused".to_string());
        assert!(is_transient_error(&error));
    }

    #[test]
    fn test_non_transient_errors() {
        assert!(!is_transient_error(&LlmError::ParseError(
            "Invalid JSON".to_string()
        )));
        assert!(!is_transient_error(&LlmError::MissingApiKey));
        assert!(!is_transient_error(&LlmError::RequestFailed(
            "builder error".to_string()
        )));
    }
}
