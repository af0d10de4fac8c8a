//! Bounded retry with exponential backoff and jitter

use crate::error::{EngineError, Result};
use crate::provider::RpcError;
use lp_config::RetrySettings;
use rand::Rng;
use std::future::Future;
use std::fmt;
use std::time::Duration;

/// Decides which RPC failures are retried
pub type Classifier = fn(&RpcError) -> bool;

#[derive(Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub use_exponential_backoff: bool,
    pub jitter: bool,
    pub classifier: Classifier,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: base_delay_ms * 60,
            use_exponential_backoff: true,
            jitter: true,
            classifier: RpcError::is_transient,
        }
    }

    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            jitter: false,
            max_delay_ms: 0,
            ..Self::new(max_attempts, 0)
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Delay before retry number `attempt` (0-based), before jitter
    pub fn calculate_delay(&self, attempt: u32) -> u64 {
        if self.use_exponential_backoff {
            let delay = self.base_delay_ms.saturating_mul(2_u64.pow(attempt.min(10))); // Cap at 2^10
            delay.min(self.max_delay_ms)
        } else {
            self.base_delay_ms
        }
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.calculate_delay(attempt);
        if !self.jitter || delay < 2 {
            return Duration::from_millis(delay);
        }
        Duration::from_millis(rand::thread_rng().gen_range(delay / 2..=delay))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or attempts run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RpcError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if !(self.classifier)(&e) => return Err(EngineError::Rpc(e)),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(EngineError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    let delay = self.jittered_delay(attempt - 1);
                    crate::log_retry!(
                        "{} attempt {}/{} failed: {}; retrying in {:?}",
                        operation,
                        attempt,
                        self.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay_ms", &self.base_delay_ms)
            .field("max_delay_ms", &self.max_delay_ms)
            .field("use_exponential_backoff", &self.use_exponential_backoff)
            .field("jitter", &self.jitter)
            .finish_non_exhaustive()
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay_ms: settings.base_delay_ms,
            max_delay_ms: settings.max_delay_ms,
            use_exponential_backoff: settings.use_exponential_backoff,
            jitter: settings.jitter,
            classifier: RpcError::is_transient,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}
