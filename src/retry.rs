// Retry with exponential backoff and jitter for transient store failures

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Delays double per attempt until max_delay.
const BACKOFF_MULTIPLIER: u32 = 2;
/// Up to +25% random jitter keeps synchronized retries from herding.
const JITTER_FACTOR: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Backoff before the retry that follows the given failed attempt
    /// (1-based), capped at max_delay.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// base_delay with jitter applied.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(0.0..=JITTER_FACTOR);
        self.base_delay(attempt).mul_f64(1.0 + jitter)
    }
}

/// Runs `op` until it succeeds, fails non-transiently, or attempts run out.
/// The last error is returned as-is.
pub async fn retry<T, E, Fut, Op>(
    policy: &RetryPolicy,
    op_name: &'static str,
    mut op: Op,
    is_transient: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    error = %e,
                    operation = op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
