//! Client wrappers

pub mod enhanced;

pub use enhanced::EnhancedClient;
