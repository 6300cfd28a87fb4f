//! Language-model-level middleware
//!
//! A middleware observes and may transform the three things that flow
//! through a client: the outgoing request, the completed response, and each
//! stream event. All three hooks default to pass-through, so an
//! implementation only overrides what it cares about.

use std::sync::Arc;

use crate::context::CallContext;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, ChatStreamEvent};

/// Model-level middleware.
///
/// Identity is [`name`](Middleware::name); the chain removes middleware by name.
pub trait Middleware: Send + Sync {
    /// Unique name for this middleware.
    fn name(&self) -> &str;

    /// Transform the request before it reaches the client.
    ///
    /// An error aborts the request; later middleware does not run.
    fn process_request(
        &self,
        _ctx: &CallContext,
        req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        Ok(req)
    }

    /// Transform the response after the client returns.
    ///
    /// `resp` is `None` when the call failed (`err` is then set) and at the
    /// end of a stream (both are `None`). An error here discards this
    /// middleware's output only.
    fn process_response(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        resp: Option<ChatResponse>,
        _err: Option<&LlmError>,
    ) -> Result<Option<ChatResponse>, LlmError> {
        Ok(resp)
    }

    /// Transform one stream event. An error discards this middleware's output only.
    fn process_stream_event(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        event: ChatStreamEvent,
    ) -> Result<ChatStreamEvent, LlmError> {
        Ok(event)
    }
}

/// Shared middleware handle
pub type MiddlewareRef = Arc<dyn Middleware>;

impl std::fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name())
            .finish()
    }
}
