//! Streaming primitives shared across the workspace.

use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

/// A boxed async stream, used for both LLM token streaming and the
/// orchestrator's per-node workflow update stream.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// A frame of the `/agent/stream` SSE response (spec.md §4.11, §6): the
/// orchestrator emits one per graph node as it runs, and a terminal error
/// frame if a node fails unrecoverably.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WorkflowFrame {
    #[serde(rename = "workflow_update")]
    Update {
        data: Value,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    #[serde(rename = "error")]
    Error {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl WorkflowFrame {
    pub fn update(node: &str, data: Value) -> Self {
        WorkflowFrame::Update {
            data: serde_json::json!({ "node": node, "payload": data }),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WorkflowFrame::Error {
            error: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Render as an SSE `data: ...\n\n` line.
    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", serde_json::to_string(self).unwrap_or_default())
    }
}

/// Token usage for a completion.
#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Terminal line closing out an `/agent/stream` SSE response (spec.md §6).
pub const DONE_MARKER: &str = "data: [DONE]\n\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_frame_wraps_node_and_payload() {
        let frame = WorkflowFrame::update("intent", serde_json::json!({"intent": "greeting"}));
        let sse = frame.to_sse();
        assert!(sse.starts_with("data: "));
        assert!(sse.contains("\"workflow_update\""));
        assert!(sse.contains("\"node\":\"intent\""));
        assert!(sse.ends_with("\n\n"));
    }

    #[test]
    fn error_frame_shape() {
        let frame = WorkflowFrame::error("llm timeout");
        let sse = frame.to_sse();
        assert!(sse.contains("\"error\":\"llm timeout\""));
    }

    #[test]
    fn terminal_done_marker_matches_sse_contract() {
        assert_eq!(DONE_MARKER, "data: [DONE]\n\n");
    }
}
