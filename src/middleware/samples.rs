//! Built-in middlewares
//!
//! - [`LoggingMiddleware`]: traces requests, responses and stream completion
//! - [`MetricsMiddleware`]: counts calls, failures and stream events
//! - [`DefaultParamsMiddleware`] / [`ClampTopPMiddleware`]: request normalization

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::language_model::{Middleware, MiddlewareRef};
use crate::context::CallContext;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, ChatStreamEvent};

/// Logs every phase through `tracing`.
#[derive(Clone, Debug, Default)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn process_request(
        &self,
        ctx: &CallContext,
        req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        tracing::info!(
            request_id = %ctx.request_id(),
            model = %req.model,
            messages = req.messages.len(),
            stream = req.stream,
            "llm request"
        );
        Ok(req)
    }

    fn process_response(
        &self,
        ctx: &CallContext,
        req: &ChatRequest,
        resp: Option<ChatResponse>,
        err: Option<&LlmError>,
    ) -> Result<Option<ChatResponse>, LlmError> {
        match (&resp, err) {
            (_, Some(e)) => tracing::warn!(
                request_id = %ctx.request_id(),
                model = %req.model,
                error = %e,
                "llm request failed"
            ),
            (Some(r), None) => tracing::info!(
                request_id = %ctx.request_id(),
                model = %req.model,
                content_len = r.content.len(),
                "llm response"
            ),
            (None, None) => tracing::info!(
                request_id = %ctx.request_id(),
                model = %req.model,
                "llm stream finished"
            ),
        }
        Ok(resp)
    }
}

/// Point-in-time copy of [`MetricsMiddleware`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub responses: u64,
    pub errors: u64,
    pub stream_events: u64,
    pub streams_completed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    responses: AtomicU64,
    errors: AtomicU64,
    stream_events: AtomicU64,
    streams_completed: AtomicU64,
}

/// Counts calls flowing through the chain. Clones share counters.
#[derive(Clone, Debug, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.counters.requests.load(Ordering::Relaxed),
            responses: self.counters.responses.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            stream_events: self.counters.stream_events.load(Ordering::Relaxed),
            streams_completed: self.counters.streams_completed.load(Ordering::Relaxed),
        }
    }
}

impl Middleware for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    fn process_request(
        &self,
        _ctx: &CallContext,
        req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        Ok(req)
    }

    fn process_response(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        resp: Option<ChatResponse>,
        err: Option<&LlmError>,
    ) -> Result<Option<ChatResponse>, LlmError> {
        let counter = match (&resp, err) {
            (_, Some(_)) => &self.counters.errors,
            (Some(_), None) => &self.counters.responses,
            (None, None) => &self.counters.streams_completed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(resp)
    }

    fn process_stream_event(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        event: ChatStreamEvent,
    ) -> Result<ChatStreamEvent, LlmError> {
        self.counters.stream_events.fetch_add(1, Ordering::Relaxed);
        Ok(event)
    }
}

/// Set a temperature default when neither temperature nor top_p is set.
#[derive(Clone, Debug)]
pub struct DefaultParamsMiddleware {
    pub temperature: f32,
}

impl Default for DefaultParamsMiddleware {
    fn default() -> Self {
        Self { temperature: 0.7 }
    }
}

impl Middleware for DefaultParamsMiddleware {
    fn name(&self) -> &str {
        "default-params"
    }

    fn process_request(
        &self,
        _ctx: &CallContext,
        mut req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        if req.temperature.is_none() && req.top_p.is_none() {
            req.temperature = Some(self.temperature);
        }
        Ok(req)
    }
}

/// Clamp top_p to [0.0, 1.0].
#[derive(Clone, Debug, Default)]
pub struct ClampTopPMiddleware;

impl Middleware for ClampTopPMiddleware {
    fn name(&self) -> &str {
        "clamp-top-p"
    }

    fn process_request(
        &self,
        _ctx: &CallContext,
        mut req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        if let Some(tp) = req.top_p {
            req.top_p = Some(tp.clamp(0.0, 1.0));
        }
        Ok(req)
    }
}

/// Helper to build the default normalization chain.
pub fn chain_default_and_clamp() -> Vec<MiddlewareRef> {
    vec![
        Arc::new(DefaultParamsMiddleware::default()),
        Arc::new(ClampTopPMiddleware),
    ]
}
