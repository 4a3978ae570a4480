//! Durable conversation history contract (external collaborator, spec.md
//! §6 `conversation:{id}:messages`). `InMemoryHistoryStore` is the
//! in-process stand-in, following the same pattern as `VectorIndex`'s
//! `InMemoryVectorIndex`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use sa_domain::conversation::ConversationMessage;
use sa_domain::error::Result;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn get_messages(&self, conversation_id: &str, limit: Option<usize>) -> Result<Vec<ConversationMessage>>;
    async fn add_message(&self, conversation_id: &str, message: ConversationMessage) -> Result<()>;
    async fn set_metadata(&self, conversation_id: &str, key: &str, value: Value) -> Result<()>;
    async fn get_metadata(&self, conversation_id: &str, key: &str) -> Result<Option<Value>>;
    async fn delete_conversation(&self, conversation_id: &str) -> Result<()>;
}

#[derive(Default)]
struct Inner {
    messages: HashMap<String, Vec<ConversationMessage>>,
    metadata: HashMap<String, HashMap<String, Value>>,
}

pub struct InMemoryHistoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::default()) }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get_messages(&self, conversation_id: &str, limit: Option<usize>) -> Result<Vec<ConversationMessage>> {
        let inner = self.inner.read();
        let Some(messages) = inner.messages.get(conversation_id) else { return Ok(Vec::new()) };
        let messages = match limit {
            Some(n) if n < messages.len() => messages[messages.len() - n..].to_vec(),
            _ => messages.clone(),
        };
        Ok(messages)
    }

    async fn add_message(&self, conversation_id: &str, message: ConversationMessage) -> Result<()> {
        self.inner.write().messages.entry(conversation_id.to_string()).or_default().push(message);
        Ok(())
    }

    async fn set_metadata(&self, conversation_id: &str, key: &str, value: Value) -> Result<()> {
        self.inner.write().metadata.entry(conversation_id.to_string()).or_default().insert(key.to_string(), value);
        Ok(())
    }

    async fn get_metadata(&self, conversation_id: &str, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.read().metadata.get(conversation_id).and_then(|m| m.get(key)).cloned())
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let mut inner = self.inner.write();
        inner.messages.remove(conversation_id);
        inner.metadata.remove(conversation_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(conversation_id: &str, sequence: u64) -> ConversationMessage {
        ConversationMessage {
            message_id: format!("{conversation_id}_{sequence}"),
            conversation_id: conversation_id.to_string(),
            role: sa_domain::conversation::MessageRole::User,
            content: "hi".into(),
            timestamp: chrono::Utc::now(),
            sequence,
            intent: None,
            entities: Vec::new(),
            tool_calls: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn messages_preserve_insertion_order() {
        let store = InMemoryHistoryStore::new();
        store.add_message("c1", msg("c1", 0)).await.unwrap();
        store.add_message("c1", msg("c1", 1)).await.unwrap();
        let messages = store.get_messages("c1", None).await.unwrap();
        assert_eq!(messages[0].sequence, 0);
        assert_eq!(messages[1].sequence, 1);
    }

    #[tokio::test]
    async fn limit_returns_most_recent_tail() {
        let store = InMemoryHistoryStore::new();
        for i in 0..5 {
            store.add_message("c1", msg("c1", i)).await.unwrap();
        }
        let messages = store.get_messages("c1", Some(2)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sequence, 3);
        assert_eq!(messages[1].sequence, 4);
    }

    #[tokio::test]
    async fn delete_conversation_clears_messages_and_metadata() {
        let store = InMemoryHistoryStore::new();
        store.add_message("c1", msg("c1", 0)).await.unwrap();
        store.set_metadata("c1", "topic", serde_json::json!("billing")).await.unwrap();
        store.delete_conversation("c1").await.unwrap();
        assert!(store.get_messages("c1", None).await.unwrap().is_empty());
        assert!(store.get_metadata("c1", "topic").await.unwrap().is_none());
    }
}
