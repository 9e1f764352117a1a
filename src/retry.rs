use crate::errors::GatewayError;
use std::future::Future;
use std::time::Duration;

/// Fixed-bound, fixed-delay retry for idempotent reads.
///
/// # Behaviour
///
/// - **Transient** failures (`timeout`, `network-unreachable`) are retried up to
///   `max_retries` additional times, sleeping `delay` between attempts.
/// - **Everything else** (`server-error`, `malformed-response`) is returned on the
///   first occurrence.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use yelp_explorer::retry::RetryPolicy;
///
/// let policy = RetryPolicy::new(2, Duration::from_millis(500));
/// assert_eq!(policy.max_attempts(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Runs `operation` until it succeeds, fails permanently, or the bound is hit.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts() => {
                    tracing::warn!(
                        "{} failed with {} (attempt {}/{}), retrying in {:?}",
                        label,
                        err.kind(),
                        attempt,
                        self.max_attempts(),
                        self.delay
                    );
                    attempt += 1;
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(err) => {
                    if attempt > 1 {
                        tracing::error!("{} gave up after {} attempts: {}", label, attempt, err);
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_timeout_retried_until_bound() {
        let calls = AtomicU32::new(0);
        let result: Result<(), GatewayError> = fast_policy()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::Timeout {
                    url: "http://x".to_string(),
                })
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Timeout);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(GatewayError::NetworkUnreachable("refused".to_string()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), GatewayError> = fast_policy()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::ServerError {
                    status: 500,
                    body: "boom".to_string(),
                })
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::ServerError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_single_attempt() {
        let calls = AtomicU32::new(0);
        let _: Result<(), GatewayError> = RetryPolicy::none()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::NetworkUnreachable("down".to_string()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
