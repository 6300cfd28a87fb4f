#![allow(clippy::large_enum_variant)]
//! Streaming event types for real-time responses

use super::chat::{ChatResponse, Usage};
use serde::{Deserialize, Serialize};

/// Chat streaming event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChatStreamEvent {
    /// Stream start event
    StreamStart {
        id: Option<String>,
        model: Option<String>,
    },
    /// Content delta (incremental text)
    ContentDelta {
        delta: String,
        /// Index of the choice (for multiple responses)
        index: Option<usize>,
    },
    /// Tool call delta
    ToolCallDelta {
        id: String,
        /// Function name (if this is the start of a tool call)
        function_name: Option<String>,
        arguments_delta: Option<String>,
    },
    /// Thinking/reasoning content delta
    ThinkingDelta { delta: String },
    /// Output of an auxiliary tool execution stream
    ToolResult {
        tool_call_id: String,
        output: serde_json::Value,
    },
    /// Usage statistics update
    UsageUpdate { usage: Usage },
    /// Stream end event with final response
    StreamEnd { response: ChatResponse },
    /// Error reported in-band by the producer
    Error { error: String },
    /// Custom provider-specific event
    Custom {
        event_type: String,
        data: serde_json::Value,
    },
}

impl ChatStreamEvent {
    pub fn content(delta: impl Into<String>) -> Self {
        Self::ContentDelta {
            delta: delta.into(),
            index: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, output: serde_json::Value) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            output,
        }
    }

    /// Text carried by a content delta.
    pub fn content_delta(&self) -> Option<&str> {
        match self {
            Self::ContentDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::StreamEnd { .. })
    }
}
