//! Retry wrappers over completion capabilities.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use super::policy::{RetryConfig, RetryExecutor};
use crate::context::CallContext;
use crate::error::LlmError;
use crate::streaming::ChatStream;
use crate::traits::{ChatCompleter, LlmClient};
use crate::types::{ChatRequest, ChatResponse, ModelInfo};

/// A [`ChatCompleter`] that retries transient failures of an inner completer.
///
/// Holds no state besides its configuration, so one instance can serve
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryCompleter<C> {
    inner: C,
    executor: RetryExecutor,
}

impl<C: ChatCompleter> RetryCompleter<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self {
            inner,
            executor: RetryExecutor::new(config),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        self.executor.config()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ChatCompleter> ChatCompleter for RetryCompleter<C> {
    async fn complete(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.executor
            .execute(ctx, || self.inner.complete(ctx, request.clone()))
            .await
    }
}

/// An [`LlmClient`] that retries completions and stream handshakes.
///
/// Streams are only retried until the base client hands one back; events
/// already delivered are never replayed.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    executor: RetryExecutor,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self {
            inner,
            executor: RetryExecutor::new(config),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        self.executor.config()
    }

    pub fn inner(&self) -> &Arc<dyn LlmClient> {
        &self.inner
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.executor
            .execute(ctx, || self.inner.chat_completion(ctx, request.clone()))
            .await
    }

    async fn stream_chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatStream, LlmError> {
        self.executor
            .execute(ctx, || self.inner.stream_chat_completion(ctx, request.clone()))
            .await
    }

    fn model_info(&self) -> ModelInfo {
        self.inner.model_info()
    }

    async fn close(&self) -> Result<(), LlmError> {
        self.inner.close().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
