//! Conversation/message domain types shared by the conversation manager,
//! orchestrator, and gateway API layer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A single turn in a conversation, as persisted by the conversation manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// `"{conversation_id}_{sequence}"` — monotonic within a conversation.
    pub message_id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Sequence number assigned at insertion time (message_count *before*
    /// this message was accepted).
    pub sequence: u64,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub tool_calls: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Analytics computed over a conversation's message history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub message_count: usize,
    pub user_message_count: usize,
    pub assistant_message_count: usize,
    pub average_message_length: f64,
    /// Number of times the classified intent changed between consecutive
    /// user messages.
    pub intent_change_count: usize,
    /// Distinct tool names invoked over the conversation's lifetime.
    pub unique_tools_used: usize,
    /// Fraction of assistant turns that recorded an error.
    pub error_rate: f64,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MessageRole::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
