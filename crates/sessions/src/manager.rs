//! ConversationManager (C10): in-memory conversation context plus writes
//! routed through a durable history store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sa_domain::conversation::{ConversationMessage, ConversationSummary, MessageRole};
use sa_domain::error::{Error, Result};
use sa_domain::trace::TraceEvent;

use crate::history::HistoryStore;

/// The in-memory working set entry for one conversation (spec.md §3
/// `ConversationContext`).
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub message_count: u64,
    pub intents: Vec<String>,
    pub confidence_scores: Vec<f32>,
    pub active_tools: HashSet<String>,
    pub topic: Option<String>,
    pub error_count: u64,
    pub agent_switches: u64,
}

impl ConversationContext {
    fn new(conversation_id: String) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            created_at: now,
            last_activity: now,
            message_count: 0,
            intents: Vec::new(),
            confidence_scores: Vec::new(),
            active_tools: HashSet::new(),
            topic: None,
            error_count: 0,
            agent_switches: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationManagerConfig {
    pub cleanup_interval: Duration,
    pub eviction_after: chrono::Duration,
}

impl Default for ConversationManagerConfig {
    fn default() -> Self {
        Self { cleanup_interval: Duration::from_secs(300), eviction_after: chrono::Duration::hours(1) }
    }
}

pub struct ConversationManager {
    config: ConversationManagerConfig,
    contexts: RwLock<HashMap<String, ConversationContext>>,
    history: Arc<dyn HistoryStore>,
}

impl ConversationManager {
    pub fn new(config: ConversationManagerConfig, history: Arc<dyn HistoryStore>) -> Self {
        Self { config, contexts: RwLock::new(HashMap::new()), history }
    }

    /// Create (or fetch) the in-memory context for `conversation_id`.
    pub fn create(&self, conversation_id: &str) -> ConversationContext {
        let mut contexts = self.contexts.write();
        contexts.entry(conversation_id.to_string()).or_insert_with(|| ConversationContext::new(conversation_id.to_string())).clone()
    }

    /// Append a message, assigning it the next sequence number and writing
    /// it through to the durable history store. `message_id` is
    /// `"{conversation_id}_{sequence}"`.
    pub async fn add_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        content: String,
        intent: Option<String>,
        confidence: Option<f32>,
        tools_used: Vec<String>,
    ) -> Result<ConversationMessage> {
        self.create(conversation_id);

        let sequence = {
            let contexts = self.contexts.read();
            contexts.get(conversation_id).map(|c| c.message_count).unwrap_or(0)
        };

        let message = ConversationMessage {
            message_id: format!("{conversation_id}_{sequence}"),
            conversation_id: conversation_id.to_string(),
            role,
            content,
            timestamp: Utc::now(),
            sequence,
            intent: intent.clone(),
            entities: Vec::new(),
            tool_calls: tools_used.clone(),
            metadata: confidence.map(|c| HashMap::from([("confidence".to_string(), serde_json::json!(c))])).unwrap_or_default(),
        };

        self.history.add_message(conversation_id, message.clone()).await?;

        let mut contexts = self.contexts.write();
        if let Some(ctx) = contexts.get_mut(conversation_id) {
            ctx.message_count += 1;
            ctx.last_activity = Utc::now();
            if let Some(intent) = intent {
                ctx.intents.push(intent);
            }
            if let Some(confidence) = confidence {
                ctx.confidence_scores.push(confidence);
            }
            ctx.active_tools.extend(tools_used);
            if matches!(role, MessageRole::Assistant) && message.metadata.get("error").is_some() {
                ctx.error_count += 1;
            }
        }

        Ok(message)
    }

    pub async fn get_history(&self, conversation_id: &str, limit: Option<usize>) -> Result<Vec<ConversationMessage>> {
        self.history.get_messages(conversation_id, limit).await
    }

    pub fn update_topic(&self, conversation_id: &str, topic: String) {
        let mut contexts = self.contexts.write();
        if let Some(ctx) = contexts.get_mut(conversation_id) {
            ctx.topic = Some(topic);
        }
    }

    /// Analytics over the full durable history: role distribution, average
    /// content length, intent-change count, tool-usage cardinality, and
    /// `error_count / max(message_count, 1)`.
    pub async fn get_summary(&self, conversation_id: &str) -> Result<ConversationSummary> {
        let messages = self.history.get_messages(conversation_id, None).await?;
        if messages.is_empty() {
            return Err(Error::NotFound(format!("conversation '{conversation_id}'")));
        }

        let user_message_count = messages.iter().filter(|m| matches!(m.role, MessageRole::User)).count();
        let assistant_message_count = messages.iter().filter(|m| matches!(m.role, MessageRole::Assistant)).count();
        let average_message_length = messages.iter().map(|m| m.content.len()).sum::<usize>() as f64 / messages.len() as f64;

        let mut intent_change_count = 0;
        let mut last_intent: Option<&str> = None;
        for message in messages.iter().filter(|m| matches!(m.role, MessageRole::User)) {
            if let Some(intent) = message.intent.as_deref() {
                if let Some(last) = last_intent {
                    if last != intent {
                        intent_change_count += 1;
                    }
                }
                last_intent = Some(intent);
            }
        }

        let unique_tools_used: HashSet<&String> = messages.iter().flat_map(|m| m.tool_calls.iter()).collect();
        let error_count = messages.iter().filter(|m| m.metadata.get("error").is_some()).count();
        let error_rate = error_count as f64 / messages.len().max(1) as f64;

        let contexts = self.contexts.read();
        let (started_at, last_active_at) = contexts
            .get(conversation_id)
            .map(|c| (c.created_at, c.last_activity))
            .unwrap_or_else(|| (messages.first().unwrap().timestamp, messages.last().unwrap().timestamp));

        Ok(ConversationSummary {
            conversation_id: conversation_id.to_string(),
            message_count: messages.len(),
            user_message_count,
            assistant_message_count,
            average_message_length,
            intent_change_count,
            unique_tools_used: unique_tools_used.len(),
            error_rate,
            started_at,
            last_active_at,
        })
    }

    /// The `limit` most recently active in-memory contexts.
    pub fn get_active(&self, limit: usize) -> Vec<ConversationContext> {
        let contexts = self.contexts.read();
        let mut all: Vec<ConversationContext> = contexts.values().cloned().collect();
        all.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        all.truncate(limit);
        all
    }

    pub async fn delete(&self, conversation_id: &str) -> Result<()> {
        self.contexts.write().remove(conversation_id);
        self.history.delete_conversation(conversation_id).await
    }

    /// Spawn the periodic eviction task: every `cleanup_interval`, drop
    /// in-memory contexts idle longer than `eviction_after`. The durable
    /// store is unaffected. Takes a snapshot of keys before mutating to
    /// avoid holding the write lock during iteration.
    pub fn spawn_eviction_task(self: &Arc<Self>, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.cleanup_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("conversation eviction task shutting down");
                        return;
                    }
                    _ = ticker.tick() => {
                        manager.evict_idle();
                    }
                }
            }
        })
    }

    fn evict_idle(&self) {
        let cutoff = Utc::now() - self.config.eviction_after;
        let stale: Vec<String> = {
            let contexts = self.contexts.read();
            contexts.values().filter(|c| c.last_activity < cutoff).map(|c| c.conversation_id.clone()).collect()
        };
        if stale.is_empty() {
            return;
        }
        let mut contexts = self.contexts.write();
        for conversation_id in stale {
            let idle_secs = (Utc::now() - contexts.get(&conversation_id).map(|c| c.last_activity).unwrap_or_else(Utc::now)).num_seconds();
            contexts.remove(&conversation_id);
            TraceEvent::ConversationEvicted { conversation_id, idle_secs }.emit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistoryStore;

    fn manager() -> ConversationManager {
        ConversationManager::new(ConversationManagerConfig::default(), Arc::new(InMemoryHistoryStore::new()))
    }

    #[tokio::test]
    async fn sequence_numbers_are_assigned_monotonically() {
        let manager = manager();
        let m0 = manager.add_message("c1", MessageRole::User, "hi".into(), None, None, Vec::new()).await.unwrap();
        let m1 = manager.add_message("c1", MessageRole::Assistant, "hello".into(), None, None, Vec::new()).await.unwrap();
        assert_eq!(m0.sequence, 0);
        assert_eq!(m1.sequence, 1);
        assert_eq!(m0.message_id, "c1_0");
        assert_eq!(m1.message_id, "c1_1");
    }

    #[tokio::test]
    async fn message_count_increments_once_per_accepted_message() {
        let manager = manager();
        manager.add_message("c1", MessageRole::User, "hi".into(), None, None, Vec::new()).await.unwrap();
        manager.add_message("c1", MessageRole::Assistant, "hello".into(), None, None, Vec::new()).await.unwrap();
        let active = manager.get_active(10);
        assert_eq!(active[0].message_count, 2);
    }

    #[tokio::test]
    async fn summary_reports_role_distribution_and_error_rate() {
        let manager = manager();
        manager.add_message("c1", MessageRole::User, "hi".into(), Some("greeting".into()), Some(0.9), Vec::new()).await.unwrap();
        manager.add_message("c1", MessageRole::Assistant, "hello".into(), None, None, Vec::new()).await.unwrap();
        let summary = manager.get_summary("c1").await.unwrap();
        assert_eq!(summary.message_count, 2);
        assert_eq!(summary.user_message_count, 1);
        assert_eq!(summary.assistant_message_count, 1);
        assert_eq!(summary.error_rate, 0.0);
    }

    #[tokio::test]
    async fn delete_removes_both_context_and_history() {
        let manager = manager();
        manager.add_message("c1", MessageRole::User, "hi".into(), None, None, Vec::new()).await.unwrap();
        manager.delete("c1").await.unwrap();
        assert!(manager.get_history("c1", None).await.unwrap().is_empty());
        assert!(manager.get_active(10).is_empty());
    }
}
