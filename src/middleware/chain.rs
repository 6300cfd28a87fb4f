//! Middleware chain
//!
//! Ordered, mutable list of middleware. Every processing call snapshots the
//! list under the read lock and releases it before running user code, so a
//! middleware may block or mutate the chain without deadlocking.
//!
//! Ordering: requests and stream events run in registration order,
//! responses in reverse registration order.

use std::sync::{PoisonError, RwLock};

use super::language_model::MiddlewareRef;
use crate::context::CallContext;
use crate::error::LlmError;
use crate::types::{ChatRequest, ChatResponse, ChatStreamEvent};

#[derive(Default)]
pub struct MiddlewareChain {
    middlewares: RwLock<Vec<MiddlewareRef>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middlewares", &self.names())
            .finish()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_middlewares(middlewares: Vec<MiddlewareRef>) -> Self {
        Self {
            middlewares: RwLock::new(middlewares),
        }
    }

    /// Append a middleware.
    pub fn add_middleware(&self, middleware: MiddlewareRef) {
        self.middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// Remove the first middleware with the given name. Returns whether one was found.
    pub fn remove_middleware(&self, name: &str) -> bool {
        let mut middlewares = self
            .middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match middlewares.iter().position(|m| m.name() == name) {
            Some(pos) => {
                middlewares.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    fn snapshot(&self) -> Vec<MiddlewareRef> {
        self.middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run every request transform in registration order.
    ///
    /// Fail-fast: the first error is returned wrapped with the failing
    /// middleware's name, and later middleware does not run.
    pub fn process_request(
        &self,
        ctx: &CallContext,
        mut req: ChatRequest,
    ) -> Result<ChatRequest, LlmError> {
        for mw in self.snapshot() {
            req = mw
                .process_request(ctx, req)
                .map_err(|e| LlmError::MiddlewareError {
                    name: mw.name().to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(req)
    }

    /// Run every response transform in reverse registration order.
    ///
    /// A failing middleware's output is discarded and the chain continues
    /// with the last good response. The completion error, if any, is only
    /// observed; it stays with the caller.
    pub fn process_response(
        &self,
        ctx: &CallContext,
        req: &ChatRequest,
        resp: Option<ChatResponse>,
        err: Option<&LlmError>,
    ) -> Option<ChatResponse> {
        let mut current = resp;
        for mw in self.snapshot().iter().rev() {
            match mw.process_response(ctx, req, current.clone(), err) {
                Ok(next) => current = next,
                Err(e) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        middleware = %mw.name(),
                        phase = "response",
                        error = %e,
                        "middleware failed; keeping previous response"
                    );
                }
            }
        }
        current
    }

    /// Run every stream-event transform in registration order.
    ///
    /// Same continue-on-error rule as [`process_response`](Self::process_response).
    pub fn process_stream_event(
        &self,
        ctx: &CallContext,
        req: &ChatRequest,
        event: ChatStreamEvent,
    ) -> ChatStreamEvent {
        let mut current = event;
        for mw in self.snapshot() {
            match mw.process_stream_event(ctx, req, current.clone()) {
                Ok(next) => current = next,
                Err(e) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        middleware = %mw.name(),
                        phase = "stream_event",
                        error = %e,
                        "middleware failed; keeping previous event"
                    );
                }
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Middleware;
    use std::sync::{Arc, Mutex};

    struct AppendModelSuffix(&'static str);

    impl Middleware for AppendModelSuffix {
        fn name(&self) -> &str {
            self.0
        }

        fn process_request(
            &self,
            _ctx: &CallContext,
            mut req: ChatRequest,
        ) -> Result<ChatRequest, LlmError> {
            req.model.push_str(self.0);
            Ok(req)
        }
    }

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn process_response(
            &self,
            _ctx: &CallContext,
            _req: &ChatRequest,
            resp: Option<ChatResponse>,
            _err: Option<&LlmError>,
        ) -> Result<Option<ChatResponse>, LlmError> {
            self.log.lock().unwrap().push(self.name.to_string());
            if self.fail {
                return Err(LlmError::InternalError("boom".into()));
            }
            Ok(resp.map(|mut r| {
                r.content.push_str(self.name);
                r
            }))
        }
    }

    #[test]
    fn request_chain_applies_in_order() {
        let chain = MiddlewareChain::new();
        chain.add_middleware(Arc::new(AppendModelSuffix("-a")));
        chain.add_middleware(Arc::new(AppendModelSuffix("-b")));
        let req = ChatRequest::default().with_model("base");
        let out = chain.process_request(&CallContext::new(), req).unwrap();
        assert_eq!(out.model, "base-a-b");
    }

    #[test]
    fn response_chain_runs_in_reverse_and_skips_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = MiddlewareChain::with_middlewares(vec![
            Arc::new(Recorder { name: "A", log: log.clone(), fail: false }),
            Arc::new(Recorder { name: "B", log: log.clone(), fail: true }),
            Arc::new(Recorder { name: "C", log: log.clone(), fail: false }),
        ]);
        let out = chain.process_response(
            &CallContext::new(),
            &ChatRequest::default(),
            Some(ChatResponse::new("x")),
            None,
        );
        assert_eq!(*log.lock().unwrap(), vec!["C", "B", "A"]);
        assert_eq!(out.unwrap().content, "xCA");
    }

    #[test]
    fn remove_middleware_by_name() {
        let chain = MiddlewareChain::new();
        chain.add_middleware(Arc::new(AppendModelSuffix("-a")));
        chain.add_middleware(Arc::new(AppendModelSuffix("-b")));
        assert!(chain.remove_middleware("-a"));
        assert!(!chain.remove_middleware("-a"));
        assert_eq!(chain.names(), vec!["-b".to_string()]);
    }
}
