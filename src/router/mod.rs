//! Message router
//!
//! Dispatches each content item of a multi-part [`Message`] to the handlers
//! registered for its [`ContentType`]. Dispatch is a broadcast: every
//! registered handler that accepts an item processes it, and one handler's
//! failure never stops the others. The result is always the best-effort
//! message, with every recorded failure aggregated into a [`MultiError`].
//!
//! ```rust,ignore
//! let router = MessageRouter::new();
//! router.register_handler(ContentType::Text, FnHandler::shared(|_, c| Ok(Some(c))));
//! let outcome = router.route_message(&ctx, &message).await;
//! if let Some(errors) = &outcome.error { /* partial failure */ }
//! ```

pub mod handler;

pub use handler::{FnHandler, HandlerRef, MessageHandler};

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::context::CallContext;
use crate::error::{LlmError, MultiError};
use crate::types::{ContentType, Message, MessageRole};

/// Result of routing one message.
///
/// `message` is populated even when `error` is set; inspect both.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub message: Message,
    pub error: Option<MultiError>,
}

impl RouteOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Some items produced output and some failed.
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.message.content.is_empty()
    }

    /// Strict view: any recorded failure becomes an error and the partial
    /// message is dropped.
    pub fn into_result(self) -> Result<Message, LlmError> {
        match self.error {
            Some(errors) => Err(LlmError::Multiple(errors)),
            None => Ok(self.message),
        }
    }
}

#[derive(Default)]
struct RouterTable {
    handlers: HashMap<ContentType, Vec<HandlerRef>>,
    default_handler: Option<HandlerRef>,
}

/// Content-type dispatch table.
#[derive(Default)]
pub struct MessageRouter {
    table: RwLock<RouterTable>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&ContentType, usize> =
            table.handlers.iter().map(|(t, h)| (t, h.len())).collect();
        f.debug_struct("MessageRouter")
            .field("handlers", &counts)
            .field("has_default", &table.default_handler.is_some())
            .finish()
    }
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the handlers for `content_type`.
    pub fn register_handler(&self, content_type: ContentType, handler: HandlerRef) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .entry(content_type)
            .or_default()
            .push(handler);
    }

    /// Remove one registration of `handler` (by pointer identity).
    ///
    /// Removing the last handler of a type drops the type entirely.
    pub fn unregister_handler(&self, content_type: &ContentType, handler: &HandlerRef) -> bool {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let Some(bucket) = table.handlers.get_mut(content_type) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|h| handler::same_handler(h, handler)) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            table.handlers.remove(content_type);
        }
        true
    }

    /// Handler used only for types with no registered handler.
    pub fn set_default_handler(&self, handler: Option<HandlerRef>) {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .default_handler = handler;
    }

    /// Content types with at least one handler.
    pub fn supported_types(&self) -> Vec<ContentType> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .keys()
            .cloned()
            .collect()
    }

    pub fn handler_count(&self, content_type: &ContentType) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .get(content_type)
            .map_or(0, Vec::len)
    }

    fn snapshot(&self) -> (HashMap<ContentType, Vec<HandlerRef>>, Option<HandlerRef>) {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        (table.handlers.clone(), table.default_handler.clone())
    }

    /// Route every content item of `message` to its handlers.
    pub async fn route_message(&self, ctx: &CallContext, message: &Message) -> RouteOutcome {
        if message.content.is_empty() {
            return RouteOutcome {
                message: Message {
                    role: MessageRole::Assistant,
                    content: Vec::new(),
                    metadata: None,
                },
                error: None,
            };
        }

        let mut response = Message {
            role: MessageRole::Assistant,
            content: Vec::new(),
            metadata: message.metadata.clone(),
        };

        let (handlers, default_handler) = self.snapshot();
        let mut errors = Vec::new();

        for (index, item) in message.content.iter().enumerate() {
            let Some(item) = item else {
                errors.push(LlmError::EmptyContent { index });
                continue;
            };
            let content_type = item.content_type();

            let selected: Vec<&HandlerRef> = match handlers.get(&content_type) {
                Some(bucket) => bucket
                    .iter()
                    .filter(|h| h.can_handle(item.as_ref()))
                    .collect(),
                None => match &default_handler {
                    Some(handler) if handler.can_handle(item.as_ref()) => vec![handler],
                    _ => {
                        errors.push(LlmError::NoHandler {
                            content_type,
                            index,
                        });
                        continue;
                    }
                },
            };

            for handler in selected {
                match handler.process(ctx, item.clone()).await {
                    Ok(Some(out)) => response.content.push(Some(out)),
                    Ok(None) => {}
                    Err(e) => errors.push(LlmError::HandlerError {
                        index,
                        content_type: content_type.clone(),
                        source: Box::new(e),
                    }),
                }
            }
        }

        for err in &errors {
            tracing::debug!(
                request_id = %ctx.request_id(),
                error = %err,
                "message routing failure"
            );
        }
        RouteOutcome {
            message: response,
            error: MultiError::from_errors(errors),
        }
    }
}
