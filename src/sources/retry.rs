//! Shared exponential-backoff helper for source clients

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::shared::errors::SourceError;

/// Retry schedule for one provider's network path
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `n` (1-based): attempt 1 is immediate,
    /// then base, 2*base, 4*base...
    fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt <= 1 {
            None
        } else {
            Some(self.base_delay * 2u32.pow(attempt - 2))
        }
    }
}

/// Run `op` under the policy's exponential backoff schedule.
///
/// Every failed attempt is logged; once the schedule is exhausted the last
/// error is wrapped into `SourceError::Unavailable` for the caller to
/// handle with its fallback.
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    source: &str,
    mut op: F,
) -> Result<T, SourceError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = String::new();

    for attempt in 1..=policy.max_attempts.max(1) {
        if let Some(delay) = policy.delay_before(attempt) {
            sleep(delay).await;
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    "⚠️ {} attempt {}/{} failed: {}",
                    source, attempt, policy.max_attempts, e
                );
                last_error = e.to_string();
            }
        }
    }

    Err(SourceError::Unavailable {
        attempts: policy.max_attempts,
        reason: last_error,
    })
}
