//! Core data types: chat requests/responses, multi-part content and stream events.

pub mod chat;
pub mod content;
pub mod streaming;

pub use chat::*;
pub use content::*;
pub use streaming::*;
