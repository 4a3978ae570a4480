//! Conversation session management (C10): durable message history plus an
//! in-memory `ConversationContext` working set with idle eviction.

pub mod history;
pub mod manager;

pub use history::{HistoryStore, InMemoryHistoryStore};
pub use manager::{ConversationContext, ConversationManager, ConversationManagerConfig};
