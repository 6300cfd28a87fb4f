//! Error Handling Module
//!
//! This module provides the error types shared by every layer of the crate:
//! - Core error type (`LlmError`) with retry classification accessors
//! - Partial-failure aggregation (`MultiError`)
//! - Conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_resilience::error::LlmError;
//!
//! let error = LlmError::api_error(503, "Service unavailable");
//! assert_eq!(error.status_code(), Some(503));
//! assert_eq!(error.error_type(), "api_error");
//! ```

mod conversions;
pub mod multi;
pub mod types;

pub use multi::*;
pub use types::*;
