//! Public Retry API Facade
//!
//! One place for the recommended retry entry points:
//!
//! - `with_retry`: wrap any [`ChatCompleter`] so its calls are retried
//! - `retry`: retry a closure with the default [`RetryConfig`]
//! - `retry_with`: retry a closure with an explicit configuration
//!
//! Example
//! ```rust,ignore
//! use siumai_resilience::retry_api::{retry_with, with_retry, RetryConfig};
//!
//! let completer = with_retry(client, Some(RetryConfig::new().with_max_retries(5)));
//! let response = completer.complete(&ctx, request).await?;
//!
//! let value = retry_with(&ctx, || do_work(), RetryConfig::default()).await?;
//! ```

use std::future::Future;

use crate::context::CallContext;
use crate::error::LlmError;
use crate::traits::ChatCompleter;

// Re-export core types for convenience
pub use crate::retry::{RetryCompleter, RetryConfig, RetryExecutor, RetryingClient};

/// Wrap `completer` so transient failures are retried.
///
/// `None` selects [`RetryConfig::default`].
pub fn with_retry<C: ChatCompleter>(
    completer: C,
    config: Option<RetryConfig>,
) -> RetryCompleter<C> {
    RetryCompleter::new(completer, config.unwrap_or_default())
}

/// Recommended default retry
pub async fn retry<F, Fut, T>(ctx: &CallContext, operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    RetryExecutor::default().execute(ctx, operation).await
}

/// Retry with an explicit configuration
pub async fn retry_with<F, Fut, T>(
    ctx: &CallContext,
    operation: F,
    config: RetryConfig,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    RetryExecutor::new(config).execute(ctx, operation).await
}

/// Retry only when a configuration is given; otherwise run `operation` once.
pub async fn maybe_retry<F, Fut, T>(
    ctx: &CallContext,
    config: Option<RetryConfig>,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    match config {
        Some(config) => retry_with(ctx, operation, config).await,
        None => operation().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn failing_op(
        counter: &Arc<AtomicU32>,
    ) -> impl FnMut() -> std::future::Ready<Result<(), LlmError>> + '_ {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(LlmError::api_error(503, "unavailable")))
        }
    }

    #[tokio::test]
    async fn maybe_retry_without_config_runs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let result = maybe_retry(&CallContext::new(), None, failing_op(&counter)).await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_with_respects_budget() {
        let counter = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(false);
        let result = retry_with(&CallContext::new(), failing_op(&counter), config).await;
        assert_eq!(result.unwrap_err().status_code(), Some(503));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn with_retry_defaults_config() {
        struct Never;

        #[async_trait::async_trait]
        impl ChatCompleter for Never {
            async fn complete(
                &self,
                _ctx: &CallContext,
                _request: crate::types::ChatRequest,
            ) -> Result<crate::types::ChatResponse, LlmError> {
                Err(LlmError::UnsupportedOperation("never".into()))
            }
        }

        let wrapped = with_retry(Never, None);
        assert_eq!(wrapped.config(), &RetryConfig::default());
    }
}
