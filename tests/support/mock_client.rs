#![allow(dead_code)]

//! Scripted client shared by the integration tests.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use siumai_resilience::prelude::*;

/// Client that fails with queued errors first, then succeeds.
#[derive(Default)]
pub struct MockClient {
    calls: AtomicU32,
    stream_calls: AtomicU32,
    failures: Mutex<VecDeque<LlmError>>,
    always_fail: Option<LlmError>,
    items: Vec<Result<ChatStreamEvent, LlmError>>,
    hang_after_items: bool,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these errors, one per call, before succeeding.
    pub fn failing_with(mut self, errors: Vec<LlmError>) -> Self {
        self.failures = Mutex::new(errors.into());
        self
    }

    pub fn always_failing(mut self, error: LlmError) -> Self {
        self.always_fail = Some(error);
        self
    }

    pub fn with_events(mut self, events: Vec<ChatStreamEvent>) -> Self {
        self.items = events.into_iter().map(Ok).collect();
        self
    }

    pub fn with_stream_items(mut self, items: Vec<Result<ChatStreamEvent, LlmError>>) -> Self {
        self.items = items;
        self
    }

    /// Keep the stream open after the scripted items instead of ending it.
    pub fn hanging(mut self) -> Self {
        self.hang_after_items = true;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> u32 {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_failure(&self, request: &ChatRequest) -> Option<LlmError> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Some(err);
        }
        self.always_fail.clone()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn chat_completion(
        &self,
        _ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_failure(&request) {
            return Err(err);
        }
        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let mut response = ChatResponse::new(format!("echo: {prompt}"));
        response.model = Some(request.model);
        Ok(response)
    }

    async fn stream_chat_completion(
        &self,
        _ctx: &CallContext,
        request: ChatRequest,
    ) -> Result<ChatStream, LlmError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.next_failure(&request) {
            return Err(err);
        }
        let scripted = stream::iter(self.items.clone());
        if self.hang_after_items {
            Ok(Box::pin(scripted.chain(stream::pending())))
        } else {
            Ok(Box::pin(scripted))
        }
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "mock".into(),
            model: "mock-1".into(),
            supports_streaming: true,
            ..Default::default()
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn rate_limited() -> LlmError {
    LlmError::RateLimitError("slow down".into())
}

pub fn hello_request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("hello")]).with_model("mock-1")
}
