//! Bounded retries with exponential backoff for translator calls
//!
//! Every attempt runs under a timeout. A call that times out counts as a retryable
//! failure, like network errors, rate limiting and provider server errors. Config and
//! locale errors fail immediately.

use crate::error::{MtError, MtResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently a single translator call is retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included (0 is treated as 1)
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
    /// Upper bound for the delay between attempts
    pub max_delay: Duration,
    /// Time limit for one attempt
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the default timeout
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently or the attempts are used up
    ///
    /// `what` names the operation in log output.
    pub async fn run<F, Fut, T>(&self, what: &str, mut op: F) -> MtResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = MtResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(self.call_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(MtError::Timeout(self.call_timeout.as_millis() as u64)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = what,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "translation call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
