//! `ConversationState` (C12): per-request scratch struct owned exclusively
//! by the orchestrator for the lifetime of one turn.

use std::collections::HashMap;

use sa_domain::entity::Entity;
use sa_domain::search::SearchResult;
use sa_domain::tool::ToolSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Tools,
    Rag,
    Direct,
    Error,
}

impl RoutingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingDecision::Tools => "tools",
            RoutingDecision::Rag => "rag",
            RoutingDecision::Direct => "direct",
            RoutingDecision::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingStage {
    Intent,
    Entities,
    ContextAnalysis,
    ToolSelect,
    ToolExec,
    Rag,
    Error,
    Response,
    ConvUpdate,
    End,
}

/// A single completed or attempted tool call, recorded for the response
/// generator's fallback summary and for the API's `actions_taken` field.
#[derive(Debug, Clone)]
pub struct ActionTaken {
    pub tool_name: String,
    pub parameters: HashMap<String, serde_json::Value>,
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// The orchestrator's per-request scratch struct, threaded node-to-node as
/// `(State) -> State`.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub utterance: String,
    pub current_intent: Option<String>,
    pub intent_confidence: f32,
    pub entities: Vec<Entity>,
    pub context: HashMap<String, serde_json::Value>,
    pub actions_taken: Vec<ActionTaken>,
    pub tool_selections: Vec<ToolSelection>,
    pub reasoning: Vec<String>,
    pub confidence_score: f32,
    pub routing_decision: Option<RoutingDecision>,
    pub rag_context: Vec<SearchResult>,
    pub error_count: u32,
    pub processing_stage: ProcessingStage,
    pub response: Option<String>,
    pub agent_type: Option<String>,
}

impl ConversationState {
    pub fn new(conversation_id: impl Into<String>, user_id: Option<String>, utterance: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id,
            utterance: utterance.into(),
            current_intent: None,
            intent_confidence: 0.0,
            entities: Vec::new(),
            context: HashMap::new(),
            actions_taken: Vec::new(),
            tool_selections: Vec::new(),
            reasoning: Vec::new(),
            confidence_score: 0.0,
            routing_decision: None,
            rag_context: Vec::new(),
            error_count: 0,
            processing_stage: ProcessingStage::Intent,
            response: None,
            agent_type: None,
        }
    }

    pub fn note(&mut self, reasoning: impl Into<String>) {
        self.reasoning.push(reasoning.into());
    }
}
