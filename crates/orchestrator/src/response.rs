//! Response generation: builds the LLM request, falls back to a
//! deterministic local agent on LLM failure (spec.md §4.11).

use sa_domain::config::{LlmConfig, OrchestratorConfig};
use sa_domain::conversation::{ConversationMessage, MessageRole};
use sa_domain::llm::{LlmMessage, LlmRequest};

use crate::routing::agent_description;
use crate::state::ConversationState;

pub fn build_request(
    state: &ConversationState,
    agent: &str,
    history: &[ConversationMessage],
    orchestrator_config: &OrchestratorConfig,
    llm_config: &LlmConfig,
) -> LlmRequest {
    let query_terms: Vec<String> = state.utterance.split_whitespace().map(|w| w.to_lowercase()).collect();
    let snippets: Vec<String> = state
        .rag_context
        .iter()
        .take(orchestrator_config.rag_snippet_count)
        .map(|r| sa_citations::snippet::select_snippet(&r.content, &query_terms))
        .collect();

    let system_prompt = format!(
        "{}\n\nIntent: {}\nTool results so far: {}\nRAG documents retrieved: {}\n{}",
        agent_description(agent),
        state.current_intent.as_deref().unwrap_or("unknown"),
        state.actions_taken.len(),
        state.rag_context.len(),
        if snippets.is_empty() { String::new() } else { format!("Relevant context:\n{}", snippets.join("\n---\n")) },
    );

    let mut messages = vec![LlmMessage::system(system_prompt)];
    for message in history.iter().rev().take(orchestrator_config.history_window).rev() {
        match message.role {
            MessageRole::User => messages.push(LlmMessage::user(message.content.clone())),
            MessageRole::Assistant => messages.push(LlmMessage::assistant(message.content.clone())),
            MessageRole::System => {}
        }
    }
    messages.push(LlmMessage::user(state.utterance.clone()));

    LlmRequest { messages, temperature: llm_config.temperature, max_tokens: llm_config.max_tokens }
}

/// Deterministic local fallback used when the LLM collaborator fails:
/// summarize tool outcomes, or give a canned reply for greeting/help.
pub fn fallback_response(state: &ConversationState) -> String {
    if let Some(intent) = &state.current_intent {
        if intent == "greeting" {
            return "Hello! How can I help you today?".to_string();
        }
        if intent == "help" {
            return "I can help with contacts, orders, inventory, reports, and meetings, or answer questions from our knowledge base.".to_string();
        }
    }

    if !state.actions_taken.is_empty() {
        let succeeded = state.actions_taken.iter().filter(|a| a.success).count();
        let failed = state.actions_taken.len() - succeeded;
        return format!("I completed {succeeded} action(s) successfully and {failed} failed. Let me know if you'd like more detail.");
    }

    if !state.rag_context.is_empty() {
        return format!("I found {} relevant document(s) but couldn't reach the language model to summarize them. Please try again shortly.", state.rag_context.len());
    }

    "I'm having trouble reaching the language model right now. Please try again shortly.".to_string()
}
