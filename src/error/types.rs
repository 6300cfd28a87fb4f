//! Core error type and retry classification accessors.

use thiserror::Error;

use super::multi::MultiError;
use crate::types::ContentType;

/// Unified error type for middleware, routing, retry and streaming operations.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// API error returned by a backend, carrying its HTTP-like status code.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// Authentication rejected (HTTP 401).
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Request timed out: {0}")]
    TimeoutError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Provider-specific failure with an optional machine-readable code.
    #[error("Provider error ({provider}): {message}")]
    ProviderError {
        provider: String,
        message: String,
        error_code: Option<String>,
        status: Option<u16>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A request middleware failed; tagged with the middleware name.
    #[error("middleware {name} failed: {source}")]
    MiddlewareError {
        name: String,
        #[source]
        source: Box<LlmError>,
    },

    /// One message handler failed for one content item.
    #[error("handler failed for content type {content_type} at index {index}: {source}")]
    HandlerError {
        index: usize,
        content_type: ContentType,
        #[source]
        source: Box<LlmError>,
    },

    #[error("no handlers found for content type {content_type} at index {index}")]
    NoHandler {
        content_type: ContentType,
        index: usize,
    },

    #[error("content item {index} is empty")]
    EmptyContent { index: usize },

    /// Aggregated partial failures.
    #[error("{0}")]
    Multiple(MultiError),

    /// The call context was cancelled.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Create an API error without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error with structured details.
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a provider error carrying a machine-readable code.
    pub fn provider_error(
        provider: impl Into<String>,
        message: impl Into<String>,
        error_code: Option<String>,
    ) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
            error_code,
            status: None,
        }
    }

    /// HTTP-like status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::RateLimitError(_) => Some(429),
            Self::AuthenticationError(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::ProviderError { status, .. } => *status,
            _ => None,
        }
    }

    /// Machine-readable error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::ProviderError { error_code, .. } => error_code.as_deref(),
            Self::ApiError {
                details: Some(details),
                ..
            } => details.get("code").and_then(|c| c.as_str()),
            _ => None,
        }
    }

    /// Stable type tag used for retry classification and logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::ApiError { .. } => "api_error",
            Self::RateLimitError(_) => "rate_limit_error",
            Self::AuthenticationError(_) => "authentication_error",
            Self::TimeoutError(_) => "timeout_error",
            Self::ConnectionError(_) => "connection_error",
            Self::ProviderError { .. } => "provider_error",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::JsonError(_) => "json_error",
            Self::ConfigurationError(_) => "configuration_error",
            Self::MiddlewareError { .. } => "middleware_error",
            Self::HandlerError { .. } => "handler_error",
            Self::NoHandler { .. } => "no_handler",
            Self::EmptyContent { .. } => "empty_content",
            Self::Multiple(_) => "multi_error",
            Self::Cancelled(_) => "cancelled",
            Self::StreamError(_) => "stream_error",
            Self::UnsupportedOperation(_) => "unsupported_operation",
            Self::InternalError(_) => "internal_error",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Default transient-failure check: 429 or any 5xx status.
    pub fn is_transient_status(&self) -> bool {
        matches!(self.status_code(), Some(429) | Some(500..=599))
    }
}
