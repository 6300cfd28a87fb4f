//! Retry Mechanism Module
//!
//! Policy-based retries for LLM calls: error classification, exponential
//! backoff with optional jitter, and a cancellation-aware executor.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::context::CallContext;
use crate::error::LlmError;

/// Retry configuration.
///
/// An error is retryable when its code, status or type tag appears in the
/// corresponding list. With all three lists empty, 429 and 5xx statuses are
/// retried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_factor: f64,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Whether to randomize delays
    pub jitter: bool,
    /// Jitter spread (0.0 to 1.0) around the computed delay
    pub jitter_factor: f64,
    /// Retry when `LlmError::error_code` is in this list
    pub retryable_error_codes: Vec<String>,
    /// Retry when `LlmError::status_code` is in this list
    pub retryable_status_codes: Vec<u16>,
    /// Retry when `LlmError::error_type` is in this list
    pub retryable_error_types: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: true,
            jitter_factor: 0.1,
            retryable_error_codes: Vec::new(),
            retryable_status_codes: Vec::new(),
            retryable_error_types: Vec::new(),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub const fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub fn with_retryable_error_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_error_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_retryable_status_codes(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = statuses.into_iter().collect();
        self
    }

    pub fn with_retryable_error_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_error_types = types.into_iter().map(Into::into).collect();
        self
    }

    fn has_classification(&self) -> bool {
        !self.retryable_error_codes.is_empty()
            || !self.retryable_status_codes.is_empty()
            || !self.retryable_error_types.is_empty()
    }

    /// Check if an error should be retried.
    pub fn is_retryable(&self, error: &LlmError) -> bool {
        if !self.has_classification() {
            return error.is_transient_status();
        }
        let code_match = error
            .error_code()
            .is_some_and(|code| self.retryable_error_codes.iter().any(|c| c == code));
        let status_match = error
            .status_code()
            .is_some_and(|status| self.retryable_status_codes.contains(&status));
        let type_match = self
            .retryable_error_types
            .iter()
            .any(|t| t == error.error_type());
        code_match || status_match || type_match
    }

    /// Delay before retry number `attempt + 1` (`attempt` is 0-based):
    /// `base_delay * backoff_factor^attempt`, capped at `max_delay`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64).max(0.0);
        let delay = Duration::from_millis(capped as u64);

        if self.jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    /// Scale `delay` by a uniform factor in `[1 - jitter_factor, 1 + jitter_factor]`.
    fn add_jitter(&self, delay: Duration) -> Duration {
        let spread = self.jitter_factor.clamp(0.0, 1.0);
        if spread == 0.0 {
            return delay;
        }
        let factor = rand::thread_rng().gen_range((1.0 - spread)..=(1.0 + spread));
        let millis = (delay.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

/// Retry executor that handles the actual retry logic
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent. Backoff sleeps end early with
    /// [`LlmError::Cancelled`] when `ctx` is cancelled.
    pub async fn execute<F, Fut, T>(
        &self,
        ctx: &CallContext,
        mut operation: F,
    ) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(cancelled());
            }
            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(
                            request_id = %ctx.request_id(),
                            attempt,
                            "request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.config.is_retryable(&error) || attempt >= self.config.max_retries {
                return Err(error);
            }

            let delay = self.config.calculate_delay(attempt);
            tracing::warn!(
                request_id = %ctx.request_id(),
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying after transient error"
            );

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(cancelled()),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

fn cancelled() -> LlmError {
    LlmError::Cancelled("context cancelled during retry".to_string())
}
