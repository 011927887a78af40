//! Retry with exponential backoff for unreliable remote calls.
//!
//! Failures are classified through [`Classify`]. Permanent errors return
//! immediately, transient ones are retried until attempts run out. Waits
//! between attempts observe a [`CancellationToken`] so a cancelled run does not
//! sit out the remaining delay.

mod error;

pub use error::{Classify, ErrorClass, RetryError};

use rand::Rng;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry policy settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Total number of invocations, including the first one.
    max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    max_delay_ms: u64,
    /// Fraction (0.0-1.0) of the computed delay added as uniform random jitter.
    jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            jitter: 0.2,
        }
    }
}

impl RetryConfig {
    /// Creates a retry policy.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, jitter: f64) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
            jitter,
        }
    }

    /// Returns the maximum number of invocations.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the base delay.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Returns the delay cap.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the jitter ratio.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Checks that the settings are usable, returning a description of the
    /// first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max-attempts must be at least 1".to_string());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err("max-delay-ms must not be smaller than base-delay-ms".to_string());
        }
        if !self.jitter.is_finite() || !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("jitter must be within 0.0-1.0, got {}", self.jitter));
        }
        Ok(())
    }

    /// Computes the wait after the given zero-based failed attempt.
    ///
    /// `delay = min(max_delay, base * 2^attempt + jitter)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let sample = rand::thread_rng().gen::<f64>();
        self.delay_with_sample(attempt, sample)
    }

    fn delay_with_sample(&self, attempt: u32, sample: f64) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt)) as f64;
        let jitter = exponential * self.jitter.clamp(0.0, 1.0) * sample.clamp(0.0, 1.0);
        let millis = (exponential + jitter).min(self.max_delay_ms as f64);
        Duration::from_millis(millis as u64)
    }

    /// Runs `operation`, retrying transient failures.
    ///
    /// # Arguments
    ///
    /// * `name` - Operation name used in logs and errors
    /// * `cancel` - Cancellation token observed before each attempt and during waits
    /// * `operation` - Factory producing one attempt per call
    ///
    /// # Errors
    ///
    /// Returns [`RetryError::Permanent`] on the first permanent failure,
    /// [`RetryError::Exhausted`] once all attempts failed transiently, and
    /// [`RetryError::Cancelled`] if the token fires first.
    pub async fn run<T, E, F, Fut>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled {
                    operation: name.to_string(),
                    attempts: attempt,
                });
            }

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation = name, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };
            attempt += 1;

            if error.classify() == ErrorClass::Permanent {
                debug!(operation = name, error = %error, "Permanent error, not retrying");
                return Err(RetryError::Permanent {
                    operation: name.to_string(),
                    source: error,
                });
            }

            if attempt >= max_attempts {
                warn!(operation = name, attempts = attempt, error = %error, "Retries exhausted");
                return Err(RetryError::Exhausted {
                    operation: name.to_string(),
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.backoff_delay(attempt - 1);
            warn!(
                operation = name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient error, retrying"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled {
                        operation: name.to_string(),
                        attempts: attempt,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
