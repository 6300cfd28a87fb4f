//! Message handler capability

use async_trait::async_trait;
use std::sync::Arc;

use crate::context::CallContext;
use crate::error::LlmError;
use crate::types::{ContentRef, MessageContent};

/// Processes one content item.
///
/// Handlers are identified by the pointer identity of their `Arc`, so the
/// same handler instance can be registered under several content types and
/// unregistered from each individually.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Whether this handler wants to process `content`.
    fn can_handle(&self, content: &dyn MessageContent) -> bool;

    /// Process `content`, returning replacement content or `None` to emit nothing.
    async fn process(
        &self,
        ctx: &CallContext,
        content: ContentRef,
    ) -> Result<Option<ContentRef>, LlmError>;
}

/// Shared handler handle
pub type HandlerRef = Arc<dyn MessageHandler>;

/// Pointer identity of two handler handles, ignoring vtables.
pub(crate) fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

type ProcessFn =
    dyn Fn(&CallContext, ContentRef) -> Result<Option<ContentRef>, LlmError> + Send + Sync;

/// Handler built from a closure; accepts every item it is routed.
pub struct FnHandler {
    func: Box<ProcessFn>,
}

impl FnHandler {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&CallContext, ContentRef) -> Result<Option<ContentRef>, LlmError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: Box::new(func),
        }
    }

    pub fn shared<F>(func: F) -> HandlerRef
    where
        F: Fn(&CallContext, ContentRef) -> Result<Option<ContentRef>, LlmError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self::new(func))
    }
}

#[async_trait]
impl MessageHandler for FnHandler {
    fn can_handle(&self, _content: &dyn MessageContent) -> bool {
        true
    }

    async fn process(
        &self,
        ctx: &CallContext,
        content: ContentRef,
    ) -> Result<Option<ContentRef>, LlmError> {
        (self.func)(ctx, content)
    }
}
