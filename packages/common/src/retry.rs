use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use tracing::warn;

/// Errors that can tell whether a failed attempt is worth repeating.
pub trait Retryable {
    /// Returns true if the failure is transient (timeouts, dropped connections).
    fn is_transient(&self) -> bool;
}

/// Retry policy for transient store failures.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt. Default: 1.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
    /// Base delay in milliseconds. Default: 50.
    #[serde(default = "default_base_ms")]
    pub base_ms: u64,
    /// Upper bound on a single delay in milliseconds. Default: 1000.
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

fn default_max_retries() -> u8 {
    1
}
fn default_base_ms() -> u64 {
    50
}
fn default_max_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_ms: default_base_ms(),
            max_ms: default_max_ms(),
        }
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}

/// Run `op`, repeating it after a backoff while it fails transiently.
///
/// Non-transient errors are returned immediately. After `policy.max_retries`
/// repeats the last transient error is surfaced to the caller.
pub async fn retry_transient<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u8 = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, policy.base_ms, policy.max_ms);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Transient failure, retrying");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
