use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use siumai_resilience::middleware::MetricsSnapshot;
use siumai_resilience::prelude::*;

#[path = "support/mock_client.rs"]
mod support;

use support::{MockClient, hello_request};

struct UppercaseDeltas;

impl Middleware for UppercaseDeltas {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn process_stream_event(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        event: ChatStreamEvent,
    ) -> Result<ChatStreamEvent, LlmError> {
        Ok(match event {
            ChatStreamEvent::ContentDelta { delta, index } => ChatStreamEvent::ContentDelta {
                delta: delta.to_uppercase(),
                index,
            },
            other => other,
        })
    }
}

struct BrokenEvents;

impl Middleware for BrokenEvents {
    fn name(&self) -> &str {
        "broken-events"
    }

    fn process_stream_event(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        _event: ChatStreamEvent,
    ) -> Result<ChatStreamEvent, LlmError> {
        Err(LlmError::StreamError("cannot process".into()))
    }
}

struct DropResponse;

impl Middleware for DropResponse {
    fn name(&self) -> &str {
        "drop-response"
    }

    fn process_response(
        &self,
        _ctx: &CallContext,
        _req: &ChatRequest,
        _resp: Option<ChatResponse>,
        _err: Option<&LlmError>,
    ) -> Result<Option<ChatResponse>, LlmError> {
        Ok(None)
    }
}

fn scripted_events() -> Vec<ChatStreamEvent> {
    vec![
        ChatStreamEvent::StreamStart {
            id: Some("s1".into()),
            model: Some("mock-1".into()),
        },
        ChatStreamEvent::content("hello "),
        ChatStreamEvent::content("world"),
        ChatStreamEvent::StreamEnd {
            response: ChatResponse::new("hello world"),
        },
    ]
}

fn deltas(events: &[Result<ChatStreamEvent, LlmError>]) -> String {
    events
        .iter()
        .filter_map(|e| e.as_ref().ok().and_then(ChatStreamEvent::content_delta))
        .collect()
}

#[tokio::test]
async fn stream_events_pass_through_middleware_and_end_once() {
    let metrics = MetricsMiddleware::new();
    let client = EnhancedClient::wrap(
        Arc::new(MockClient::new().with_events(scripted_events())),
        vec![Arc::new(metrics.clone()), Arc::new(UppercaseDeltas)],
    );

    let stream = client
        .stream_chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap();
    let events: Vec<_> = stream.collect().await;

    assert_eq!(events.len(), 4);
    assert_eq!(deltas(&events), "HELLO WORLD");
    assert!(events.last().unwrap().as_ref().unwrap().is_end());
    assert_eq!(
        metrics.snapshot(),
        MetricsSnapshot {
            requests: 1,
            responses: 0,
            errors: 0,
            stream_events: 4,
            streams_completed: 1,
        }
    );
}

#[tokio::test]
async fn failing_event_middleware_keeps_previous_event() {
    let client = EnhancedClient::wrap(
        Arc::new(MockClient::new().with_events(scripted_events())),
        vec![Arc::new(UppercaseDeltas), Arc::new(BrokenEvents)],
    );

    let events: Vec<_> = client
        .stream_chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(deltas(&events), "HELLO WORLD");
}

#[tokio::test]
async fn raw_stream_errors_are_forwarded_untouched() {
    let client = EnhancedClient::wrap(
        Arc::new(MockClient::new().with_stream_items(vec![
            Ok(ChatStreamEvent::content("partial")),
            Err(LlmError::StreamError("connection reset".into())),
        ])),
        vec![Arc::new(UppercaseDeltas)],
    );

    let events: Vec<_> = client
        .stream_chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(deltas(&events), "PARTIAL");
    assert!(matches!(&events[1], Err(LlmError::StreamError(msg)) if msg == "connection reset"));
}

#[tokio::test]
async fn base_stream_failure_runs_response_phase_with_error() {
    let metrics = MetricsMiddleware::new();
    let base = Arc::new(MockClient::new().always_failing(LlmError::api_error(500, "boom")));
    let client = EnhancedClient::wrap(base.clone(), vec![Arc::new(metrics.clone())]);

    let result = client
        .stream_chat_completion(&CallContext::new(), hello_request())
        .await;

    let err = result.err().expect("stream handshake should fail");
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(base.stream_calls(), 1);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.streams_completed, 0);
}

#[tokio::test]
async fn cancellation_closes_the_stream_without_end_call() {
    let metrics = MetricsMiddleware::new();
    let client = EnhancedClient::wrap(
        Arc::new(
            MockClient::new()
                .with_events(vec![ChatStreamEvent::content("first")])
                .hanging(),
        ),
        vec![Arc::new(metrics.clone())],
    );

    let ctx = CallContext::new();
    let mut stream = client
        .stream_chat_completion(&ctx, hello_request())
        .await
        .unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.content_delta(), Some("first"));

    ctx.cancel();
    let next = tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("stream should close after cancellation");
    assert!(next.is_none());
    assert_eq!(metrics.snapshot().streams_completed, 0);
}

#[tokio::test]
async fn cleared_response_is_an_internal_error() {
    let client = EnhancedClient::wrap(Arc::new(MockClient::new()), vec![Arc::new(DropResponse)]);
    let err = client
        .chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InternalError(_)));
}

#[tokio::test]
async fn double_wrap_runs_each_middleware_once() {
    let metrics = MetricsMiddleware::new();
    let base = Arc::new(MockClient::new());
    let once = EnhancedClient::wrap(base.clone(), vec![Arc::new(metrics.clone())]);
    let twice = EnhancedClient::wrap(once.clone(), vec![Arc::new(UppercaseDeltas)]);

    assert!(Arc::ptr_eq(&once, &twice));
    twice
        .chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap();

    assert_eq!(metrics.snapshot().requests, 1);
    assert_eq!(base.calls(), 1);
    let enhanced = twice.as_any().downcast_ref::<EnhancedClient>().unwrap();
    assert_eq!(enhanced.chain().names(), vec!["metrics", "uppercase"]);
    assert_eq!(twice.model_info().provider, "mock");
}

#[tokio::test]
async fn middleware_can_be_removed_at_runtime() {
    let metrics = MetricsMiddleware::new();
    let enhanced = EnhancedClient::new(
        Arc::new(MockClient::new()),
        Arc::new(MiddlewareChain::with_middlewares(vec![Arc::new(metrics.clone())])),
    );

    enhanced
        .chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap();
    assert!(enhanced.remove_middleware("metrics"));
    enhanced
        .chat_completion(&CallContext::new(), hello_request())
        .await
        .unwrap();

    assert_eq!(metrics.snapshot().requests, 1);
    assert!(enhanced.chain().is_empty());
}
