//! Orchestrator (C12): the directed state-graph that turns one utterance
//! into a routed, persisted conversation turn.
//!
//! ```text
//! INTENT -> ENTITIES -> CONTEXT_ANALYSIS -(routing)-> { TOOL_SELECT -> TOOL_EXEC,
//!                                                       RAG,
//!                                                       ERROR }
//!                                                   -> RESPONSE -> CONV_UPDATE -> END
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use sa_citations::{CitationGenerator, CitationGeneratorConfig};
use sa_domain::config::OrchestratorConfig;
use sa_domain::conversation::MessageRole;
use sa_domain::error::Result;
use sa_domain::llm::LlmClient;
use sa_domain::search::{SearchFilters, SearchType};
use sa_domain::stream::{BoxStream, WorkflowFrame};
use sa_domain::trace::TraceEvent;
use sa_nlu::{EntityExtractor, IntentClassifier};
use sa_search::HybridSearch;
use sa_sessions::ConversationManager;
use sa_tools::ToolDispatcher;

use crate::response::{build_request, fallback_response};
use crate::routing::{decide_routing, select_agent, select_tools};
use crate::state::{ActionTaken, ConversationState, ProcessingStage, RoutingDecision};

pub struct Orchestrator {
    config: OrchestratorConfig,
    llm_config: sa_domain::config::LlmConfig,
    intent_classifier: IntentClassifier,
    entity_extractor: EntityExtractor,
    conversations: Arc<ConversationManager>,
    tools: Arc<ToolDispatcher>,
    search: Arc<HybridSearch>,
    citations: CitationGenerator,
    llm: Arc<dyn LlmClient>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        llm_config: sa_domain::config::LlmConfig,
        intent_classifier: IntentClassifier,
        entity_extractor: EntityExtractor,
        conversations: Arc<ConversationManager>,
        tools: Arc<ToolDispatcher>,
        search: Arc<HybridSearch>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            config,
            llm_config,
            intent_classifier,
            entity_extractor,
            conversations,
            tools,
            search,
            citations: CitationGenerator::new(CitationGeneratorConfig::default()),
            llm,
        }
    }

    /// Run one turn to completion, emitting no intermediate frames.
    pub async fn run(&self, conversation_id: &str, user_id: Option<String>, utterance: &str) -> Result<ConversationState> {
        let mut state = ConversationState::new(conversation_id, user_id, utterance);
        self.intent_node(&mut state).await;
        self.entities_node(&mut state).await;
        self.context_analysis_node(&mut state).await;

        match state.routing_decision {
            Some(RoutingDecision::Tools) => {
                self.tool_select_node(&mut state);
                self.tool_exec_node(&mut state).await;
            }
            Some(RoutingDecision::Rag) => self.rag_node(&mut state).await,
            Some(RoutingDecision::Error) => self.error_node(&mut state),
            _ => {}
        }

        self.response_node(&mut state).await;
        self.conv_update_node(&mut state).await?;
        state.processing_stage = ProcessingStage::End;
        Ok(state)
    }

    /// Run one turn, emitting a `WorkflowFrame::Update` after each node and
    /// a terminal `WorkflowFrame::Error` if persistence or response
    /// generation fails unrecoverably.
    pub fn run_streaming(self: Arc<Self>, conversation_id: String, user_id: Option<String>, utterance: String) -> BoxStream<'static, WorkflowFrame> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<WorkflowFrame>(32);
        tokio::spawn(async move {
            let mut state = ConversationState::new(&conversation_id, user_id, &utterance);

            self.intent_node(&mut state).await;
            let _ = tx.send(WorkflowFrame::update("intent", serde_json::json!({"intent": state.current_intent, "confidence": state.intent_confidence}))).await;

            self.entities_node(&mut state).await;
            let _ = tx.send(WorkflowFrame::update("entities", serde_json::json!({"count": state.entities.len()}))).await;

            self.context_analysis_node(&mut state).await;
            let _ = tx
                .send(WorkflowFrame::update("context_analysis", serde_json::json!({"routing": state.routing_decision.map(|r| r.as_str())})))
                .await;

            match state.routing_decision {
                Some(RoutingDecision::Tools) => {
                    self.tool_select_node(&mut state);
                    self.tool_exec_node(&mut state).await;
                    let _ = tx.send(WorkflowFrame::update("tool_exec", serde_json::json!({"actions": state.actions_taken.len()}))).await;
                }
                Some(RoutingDecision::Rag) => {
                    self.rag_node(&mut state).await;
                    let _ = tx.send(WorkflowFrame::update("rag", serde_json::json!({"sources": state.rag_context.len()}))).await;
                }
                Some(RoutingDecision::Error) => {
                    self.error_node(&mut state);
                    let _ = tx.send(WorkflowFrame::update("error", serde_json::json!({"reason": "error budget exceeded"}))).await;
                }
                _ => {}
            }

            self.response_node(&mut state).await;
            let _ = tx.send(WorkflowFrame::update("response", serde_json::json!({"response": state.response}))).await;

            if let Err(e) = self.conv_update_node(&mut state).await {
                let _ = tx.send(WorkflowFrame::error(e.to_string())).await;
                return;
            }
            let _ = tx.send(WorkflowFrame::update("end", serde_json::json!({"conversation_id": state.conversation_id}))).await;
        });

        Box::pin(async_stream::stream! {
            while let Some(frame) = rx.recv().await {
                yield frame;
            }
        })
    }

    async fn intent_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::Intent;
        match self.intent_classifier.classify(&state.utterance, "en") {
            Some(result) => {
                state.note(format!("classified intent '{}' at {:.2}", result.intent, result.confidence));
                TraceEvent::IntentClassified { conversation_id: state.conversation_id.clone(), intent: result.intent.clone(), confidence: result.confidence }.emit();
                state.intent_confidence = result.confidence;
                state.current_intent = Some(result.intent);
            }
            None => {
                state.note("no intent cleared its threshold");
                state.current_intent = Some(sa_domain::intent::well_known::UNKNOWN.to_string());
            }
        }
    }

    async fn entities_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::Entities;
        state.entities = self.entity_extractor.extract(&state.utterance);
        state.note(format!("extracted {} entities", state.entities.len()));
        TraceEvent::EntitiesExtracted { conversation_id: state.conversation_id.clone(), count: state.entities.len() }.emit();
    }

    async fn context_analysis_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::ContextAnalysis;
        let intent = state.current_intent.clone().unwrap_or_default();
        let decision = decide_routing(&intent, &state.entities, &state.utterance, state.error_count, self.config.max_retries);
        state.agent_type = Some(select_agent(&intent, &state.entities).to_string());
        state.note(format!("routing decision: {}", decision.as_str()));
        TraceEvent::RoutingDecided { conversation_id: state.conversation_id.clone(), decision: decision.as_str().to_string() }.emit();
        state.routing_decision = Some(decision);
    }

    fn tool_select_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::ToolSelect;
        let intent = state.current_intent.clone().unwrap_or_default();
        state.tool_selections = select_tools(&intent, &state.entities);
    }

    async fn tool_exec_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::ToolExec;
        let selections = state.tool_selections.clone();
        for selection in selections {
            match self.tools.execute_tool(&selection.tool_name, selection.parameters.clone()).await {
                Ok(result) => {
                    state.actions_taken.push(ActionTaken {
                        tool_name: selection.tool_name,
                        parameters: selection.parameters,
                        success: true,
                        result: Some(result),
                        error: None,
                    });
                }
                Err(e) => {
                    state.error_count += 1;
                    state.note(format!("tool '{}' failed: {e}", selection.tool_name));
                    state.actions_taken.push(ActionTaken {
                        tool_name: selection.tool_name,
                        parameters: selection.parameters,
                        success: false,
                        result: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
    }

    async fn rag_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::Rag;
        let filters: SearchFilters = HashMap::new();
        let outcome = tokio::time::timeout(
            Duration::from_secs(30),
            self.search.search(&state.utterance, self.config.rag_top_k, SearchType::Hybrid, self.config.rag_similarity_threshold, &filters),
        )
        .await;

        match outcome {
            Ok(Ok(results)) => {
                state.note(format!("RAG retrieved {} sources", results.len()));
                state.rag_context = results;
            }
            Ok(Err(e)) => {
                state.error_count += 1;
                state.note(format!("RAG search failed: {e}"));
            }
            Err(_) => {
                state.error_count += 1;
                state.note("RAG search timed out after 30s");
            }
        }
    }

    fn error_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::Error;
        state.response = Some("I'm sorry, I've run into repeated errors handling this request. Please try again or rephrase.".to_string());
    }

    async fn response_node(&self, state: &mut ConversationState) {
        state.processing_stage = ProcessingStage::Response;
        if state.response.is_some() {
            return;
        }

        let agent = state.agent_type.clone().unwrap_or_else(|| "GENERAL_ASSISTANT".to_string());
        let history = self.conversations.get_history(&state.conversation_id, Some(self.config.history_window)).await.unwrap_or_default();
        let request = build_request(state, &agent, &history, &self.config, &self.llm_config);

        let outcome = tokio::time::timeout(Duration::from_secs(self.llm_config.timeout_secs), self.llm.complete(request)).await;
        match outcome {
            Ok(Ok(response)) => state.response = Some(response.content),
            Ok(Err(e)) => {
                warn!("llm completion failed: {e}");
                TraceEvent::LlmFallback {
                    from_provider: self.llm_config.base_url.clone(),
                    from_model: String::new(),
                    to_provider: "deterministic-local".to_string(),
                    to_model: "local-agent".to_string(),
                    reason: e.to_string(),
                }
                .emit();
                state.error_count += 1;
                state.response = Some(fallback_response(state));
            }
            Err(_) => {
                warn!("llm completion timed out");
                TraceEvent::LlmFallback {
                    from_provider: self.llm_config.base_url.clone(),
                    from_model: String::new(),
                    to_provider: "deterministic-local".to_string(),
                    to_model: "local-agent".to_string(),
                    reason: "timeout".to_string(),
                }
                .emit();
                state.error_count += 1;
                state.response = Some(fallback_response(state));
            }
        }
    }

    async fn conv_update_node(&self, state: &mut ConversationState) -> Result<()> {
        state.processing_stage = ProcessingStage::ConvUpdate;
        let intent = state.current_intent.clone();
        let tools_used: Vec<String> = state.actions_taken.iter().map(|a| a.tool_name.clone()).collect();

        self.conversations
            .add_message(&state.conversation_id, MessageRole::User, state.utterance.clone(), intent.clone(), Some(state.intent_confidence), Vec::new())
            .await?;

        let response = state.response.clone().unwrap_or_default();
        self.conversations.add_message(&state.conversation_id, MessageRole::Assistant, response, intent, None, tools_used).await?;

        Ok(())
    }

    /// Generate citation-formatted sources for the last RAG retrieval, for
    /// API consumers that want bibliographic output alongside the answer.
    pub fn cite(&self, state: &ConversationState) -> Vec<Value> {
        let query_terms: Vec<String> = state.utterance.split_whitespace().map(|w| w.to_lowercase()).collect();
        self.citations.generate(&state.rag_context, &query_terms).into_iter().map(|c| serde_json::to_value(c).unwrap_or(Value::Null)).collect()
    }
}
