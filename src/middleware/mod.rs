//! Middleware module (model-level)
//!
//! Middleware sits between the application and a client: it can rewrite the
//! request, the response and every stream event. [`MiddlewareChain`] holds
//! the ordered list and [`crate::client::EnhancedClient`] runs it around a
//! base client.

pub mod chain;
pub mod language_model;
pub mod samples;

pub use chain::MiddlewareChain;
pub use language_model::{Middleware, MiddlewareRef};
pub use samples::*;
