//! Enhanced client
//!
//! Wraps a base [`LlmClient`] with a [`MiddlewareChain`] and exposes the same
//! client contract, so it can be handed anywhere a client is expected.
//!
//! ```rust,ignore
//! let client = EnhancedClient::wrap(base, vec![Arc::new(LoggingMiddleware)]);
//! let resp = client.chat_completion(&ctx, request).await?;
//! ```

use async_trait::async_trait;
use futures::StreamExt;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::context::CallContext;
use crate::error::LlmError;
use crate::middleware::{MiddlewareChain, MiddlewareRef};
use crate::streaming::{ChatStream, ReceiverStream};
use crate::traits::LlmClient;
use crate::types::{ChatRequest, ChatResponse, ModelInfo};

const STREAM_BUFFER: usize = 64;

/// A client that runs every call through a middleware chain.
pub struct EnhancedClient {
    base: Arc<dyn LlmClient>,
    chain: Arc<MiddlewareChain>,
}

impl std::fmt::Debug for EnhancedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancedClient")
            .field("base", &self.base.model_info())
            .field("chain", &self.chain)
            .finish()
    }
}

impl EnhancedClient {
    pub fn new(base: Arc<dyn LlmClient>, chain: Arc<MiddlewareChain>) -> Self {
        Self { base, chain }
    }

    /// Wrap `client` with `middlewares`.
    ///
    /// If `client` already is an `EnhancedClient`, the middlewares are
    /// appended to its chain and the same client is returned; wrapping never
    /// nests.
    pub fn wrap(client: Arc<dyn LlmClient>, middlewares: Vec<MiddlewareRef>) -> Arc<dyn LlmClient> {
        if let Some(existing) = client.as_any().downcast_ref::<EnhancedClient>() {
            for mw in middlewares {
                existing.chain.add_middleware(mw);
            }
            return client;
        }
        let chain = Arc::new(MiddlewareChain::with_middlewares(middlewares));
        Arc::new(Self::new(client, chain))
    }

    pub fn chain(&self) -> &Arc<MiddlewareChain> {
        &self.chain
    }

    pub fn base(&self) -> &Arc<dyn LlmClient> {
        &self.base
    }

    pub fn add_middleware(&self, middleware: MiddlewareRef) {
        self.chain.add_middleware(middleware);
    }

    pub fn remove_middleware(&self, name: &str) -> bool {
        self.chain.remove_middleware(name)
    }
}

#[async_trait]
impl LlmClient for EnhancedClient {
    async fn chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.chain.process_request(ctx, request)?;
        let result = self.base.chat_completion(ctx, request.clone()).await;
        match result {
            Ok(resp) => self
                .chain
                .process_response(ctx, &request, Some(resp), None)
                .ok_or_else(|| {
                    LlmError::InternalError(
                        "response middleware cleared the completion response".to_string(),
                    )
                }),
            Err(err) => {
                // Observed only; the base error is what the caller gets.
                let _ = self.chain.process_response(ctx, &request, None, Some(&err));
                Err(err)
            }
        }
    }

    async fn stream_chat_completion(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatStream, LlmError> {
        let request = self.chain.process_request(ctx, request)?;
        let mut raw = match self.base.stream_chat_completion(ctx, request.clone()).await {
            Ok(stream) => stream,
            Err(err) => {
                let _ = self.chain.process_response(ctx, &request, None, Some(&err));
                return Err(err);
            }
        };

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let chain = Arc::clone(&self.chain);
        let ctx = ctx.clone();
        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        tracing::debug!(
                            request_id = %ctx.request_id(),
                            "stream forwarding cancelled"
                        );
                        return;
                    }
                    item = raw.next() => item,
                };
                let Some(item) = item else { break };
                let item = item.map(|event| chain.process_stream_event(&ctx, &request, event));
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return,
                    sent = tx.send(item) => {
                        if sent.is_err() {
                            tracing::debug!(
                                request_id = %ctx.request_id(),
                                "stream consumer dropped"
                            );
                            return;
                        }
                    }
                }
            }
            // Lets completion-tracking middleware observe end of stream.
            let _ = chain.process_response(&ctx, &request, None, None);
            drop(tx);
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn model_info(&self) -> ModelInfo {
        self.base.model_info()
    }

    async fn close(&self) -> Result<(), LlmError> {
        self.base.close().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
