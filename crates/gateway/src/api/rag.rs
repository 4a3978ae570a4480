//! `POST /rag` — retrieval-augmented generation: hybrid search for context,
//! then an LLM completion grounded in the retrieved snippets.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sa_domain::llm::{LlmMessage, LlmRequest};
use sa_domain::search::{SearchFilters, SearchType};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RagRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_true")]
    pub include_sources: bool,
}

fn default_top_k() -> usize {
    5
}
fn default_threshold() -> f32 {
    0.7
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct RagResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<Value>,
    pub confidence: f32,
    pub model_used: Option<String>,
    pub processing_time: f64,
}

/// RAG failure policy (spec.md §7): if retrieval fails, continue with an
/// empty context rather than failing the request outright.
pub async fn rag(State(state): State<AppState>, Json(req): Json<RagRequest>) -> ApiResult<Json<RagResponse>> {
    let started = Instant::now();
    let filters: SearchFilters = Default::default();

    let results = state
        .search
        .search(&req.question, req.top_k, SearchType::Hybrid, req.similarity_threshold, &filters)
        .await
        .unwrap_or_default();

    let query_terms: Vec<String> = req.question.split_whitespace().map(|w| w.to_lowercase()).collect();
    let citations = state.citations.generate(&results, &query_terms);

    let context = citations
        .iter()
        .map(|c| format!("{} {}", c.formatted_citation, c.content_snippet))
        .collect::<Vec<_>>()
        .join("\n");

    let system_prompt = if context.is_empty() {
        "Answer the user's question as best you can. No supporting documents were found.".to_string()
    } else {
        format!("Answer the user's question using only the following retrieved context. Cite sources by their bracketed number.\n\n{context}")
    };

    let request = LlmRequest {
        messages: vec![LlmMessage::system(system_prompt), LlmMessage::user(req.question.clone())],
        temperature: req.temperature,
        max_tokens: req.max_tokens,
    };

    let outcome = tokio::time::timeout(Duration::from_secs(30), state.llm.complete(request)).await;
    let (answer, model_used) = match outcome {
        Ok(Ok(response)) => (response.content, response.model),
        _ => ("I'm unable to generate an answer right now. Please try again shortly.".to_string(), None),
    };

    let confidence = results.first().map(|r| r.score).unwrap_or(0.0);
    let sources = if req.include_sources {
        citations.into_iter().map(|c| serde_json::to_value(c).unwrap_or(Value::Null)).collect()
    } else {
        Vec::new()
    };

    Ok(Json(RagResponse {
        question: req.question,
        answer,
        sources,
        confidence,
        model_used: req.model.or(model_used),
        processing_time: started.elapsed().as_secs_f64(),
    }))
}
