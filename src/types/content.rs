//! Multi-part message content
//!
//! Concrete multi-modal payloads (images, files, audio) live with the
//! applications and providers that produce them. This module only defines the
//! capability every payload exposes, plus a plain text payload.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::chat::MessageRole;
use crate::error::LlmError;

/// Content type tag used for handler dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    File,
    Audio,
    /// Application-defined content type
    Custom(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Audio => "audio",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        match value {
            "text" => Self::Text,
            "image" => Self::Image,
            "file" => Self::File,
            "audio" => Self::Audio,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// A typed content payload.
pub trait MessageContent: fmt::Debug + Send + Sync {
    fn content_type(&self) -> ContentType;

    /// Check the payload is well formed.
    fn validate(&self) -> Result<(), LlmError>;

    /// Payload size in bytes.
    fn size(&self) -> usize;

    /// Get as Any for downcasting to the concrete payload.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a content payload.
pub type ContentRef = Arc<dyn MessageContent>;

/// Plain text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Convenience constructor returning a shared handle.
    pub fn shared(text: impl Into<String>) -> ContentRef {
        Arc::new(Self::new(text))
    }
}

impl MessageContent for TextContent {
    fn content_type(&self) -> ContentType {
        ContentType::Text
    }

    fn validate(&self) -> Result<(), LlmError> {
        if self.text.is_empty() {
            return Err(LlmError::InvalidInput("text content is empty".to_string()));
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.text.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcast helper for text payloads.
pub fn as_text(content: &dyn MessageContent) -> Option<&TextContent> {
    content.as_any().downcast_ref::<TextContent>()
}

/// A multi-part message routed by [`crate::router::MessageRouter`].
///
/// A `None` slot marks an item whose payload is missing; routing reports it
/// and moves on to the next item.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<Option<ContentRef>>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Message {
    pub fn new(role: MessageRole) -> Self {
        Self {
            role,
            content: Vec::new(),
            metadata: None,
        }
    }

    pub fn user() -> Self {
        Self::new(MessageRole::User)
    }

    pub fn assistant() -> Self {
        Self::new(MessageRole::Assistant)
    }

    pub fn with_content(mut self, content: ContentRef) -> Self {
        self.content.push(Some(content));
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(TextContent::shared(text))
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Present content items, skipping missing slots.
    pub fn items(&self) -> impl Iterator<Item = &ContentRef> {
        self.content.iter().flatten()
    }

    /// Texts of all text items, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.items()
            .filter_map(|c| as_text(c.as_ref()))
            .map(|t| t.text.as_str())
            .collect()
    }

    /// Total byte size of present items.
    pub fn size(&self) -> usize {
        self.items().map(|c| c.size()).sum()
    }
}
