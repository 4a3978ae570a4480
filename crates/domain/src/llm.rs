//! LLM completion collaborator contract (C13). Prompt construction and
//! response generation live in `sa-orchestrator`; this module only carries
//! the shared wire types and the trait boundary, since the completion
//! server itself is out of scope (spec.md §1).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::stream::BoxStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

/// A single message in a completion request. Plain text only — the
/// orchestrator never needs multi-part content (images, tool-use blocks);
/// tool results are folded into `state.reasoning` and the system prompt
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: LlmRole::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: LlmRole::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: LlmRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// A single streamed completion token, distinct from `stream::StreamEvent`
/// (the orchestrator's own per-node workflow frames) — this is the
/// collaborator's raw token stream before it's folded into a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmToken {
    pub text: String,
    pub done: bool,
}

/// Contract for the external LLM completion server. A single request/
/// response call plus a streaming variant; everything about prompt
/// engineering, model selection, and sampling happens above this boundary.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    async fn stream(&self, request: LlmRequest) -> Result<BoxStream<'static, LlmToken>>;
}
