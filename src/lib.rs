//! # siumai-resilience
//!
//! Provider-agnostic resiliency and dispatch for siumai LLM clients.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Middleware Chain**: ordered request/response/stream-event transforms, run by [`client::EnhancedClient`]
//! - **Message Router**: per-content-type dispatch of multi-part messages with partial-failure results
//! - **Retry**: classified exponential backoff that stops promptly on cancellation
//! - **Stream Merger**: fan-in of several event streams into one
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use siumai_resilience::prelude::*;
//!
//! let client = EnhancedClient::wrap(base, vec![Arc::new(LoggingMiddleware)]);
//! let client = RetryingClient::new(client, RetryConfig::default());
//!
//! let ctx = CallContext::new();
//! let response = client
//!     .chat_completion(&ctx, ChatRequest::new(vec![ChatMessage::user("Hello")]))
//!     .await?;
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod middleware;
pub mod retry;
pub mod retry_api;
pub mod router;
pub mod streaming;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use error::{LlmError, MultiError};

pub mod prelude {
    //! Common imports.

    pub use crate::client::EnhancedClient;
    pub use crate::context::CallContext;
    pub use crate::error::{LlmError, MultiError};
    pub use crate::middleware::{
        ClampTopPMiddleware, DefaultParamsMiddleware, LoggingMiddleware, MetricsMiddleware,
        Middleware, MiddlewareChain, MiddlewareRef,
    };
    pub use crate::retry_api::*;
    pub use crate::router::{FnHandler, HandlerRef, MessageHandler, MessageRouter, RouteOutcome};
    pub use crate::streaming::{ChatStream, ChatStreamEvent, StreamMerger, merge_streams};
    pub use crate::traits::{ChatCompleter, LlmClient, SharedCompleter};
    pub use crate::types::{
        ChatMessage, ChatRequest, ChatResponse, ContentRef, ContentType, Message, MessageContent,
        MessageRole, ModelInfo, TextContent,
    };
}
