//! Type Conversions for LlmError
//!
//! From trait implementations for converting common error types into LlmError.

use super::multi::MultiError;
use super::types::LlmError;

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<MultiError> for LlmError {
    fn from(err: MultiError) -> Self {
        Self::Multiple(err)
    }
}

impl From<tokio::time::error::Elapsed> for LlmError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        Self::TimeoutError(err.to_string())
    }
}
