//! Client capability traits

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;

use crate::context::CallContext;
use crate::error::LlmError;
use crate::streaming::ChatStream;
use crate::types::{ChatRequest, ChatResponse, ModelInfo};

/// Unified LLM client interface.
///
/// Provider adapters implement this; the wrappers in this crate
/// ([`crate::client::EnhancedClient`], [`crate::retry::RetryingClient`])
/// implement it too, so they nest freely.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Perform one completion.
    async fn chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError>;

    /// Perform one streaming completion.
    async fn stream_chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatStream, LlmError>;

    /// Report remote/model information.
    fn model_info(&self) -> ModelInfo;

    /// Release resources held by the client.
    async fn close(&self) -> Result<(), LlmError> {
        Ok(())
    }

    /// Get as Any for dynamic casting
    fn as_any(&self) -> &dyn Any;
}

/// The narrow capability of performing one completion call.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError>;
}

#[async_trait]
impl<C: LlmClient + ?Sized> ChatCompleter for C {
    async fn complete(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.chat_completion(ctx, request).await
    }
}

/// Adapter turning a shared client handle into a [`ChatCompleter`].
#[derive(Clone)]
pub struct SharedCompleter(pub Arc<dyn LlmClient>);

#[async_trait]
impl ChatCompleter for SharedCompleter {
    async fn complete(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.0.chat_completion(ctx, request).await
    }
}
