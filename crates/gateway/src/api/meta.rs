//! `GET /intents`, `GET /entities`, `GET /stats`, `GET /health` —
//! introspection and liveness endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use sa_domain::entity::{business_labels, generic_labels};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IntentInfo {
    pub name: String,
    pub examples: Vec<String>,
    pub confidence_threshold: f32,
}

pub async fn intents(State(state): State<AppState>) -> Json<Vec<IntentInfo>> {
    let infos = state
        .intent_classifier
        .definitions()
        .iter()
        .map(|d| IntentInfo { name: d.name.clone(), examples: d.examples.clone(), confidence_threshold: d.confidence_threshold })
        .collect();
    Json(infos)
}

#[derive(Debug, Serialize)]
pub struct EntityLabelsResponse {
    pub business_labels: Vec<&'static str>,
    pub generic_labels: Vec<&'static str>,
}

pub async fn entities() -> Json<EntityLabelsResponse> {
    Json(EntityLabelsResponse { business_labels: business_labels::ALL.to_vec(), generic_labels: generic_labels::ALL.to_vec() })
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub active_conversations: usize,
    pub tool_executions: usize,
    pub documents_indexed: usize,
    pub embeddings_encoded: u64,
    pub batch_jobs_run: u64,
    pub batch_jobs_failed: u64,
    pub uptime_secs: i64,
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let documents_indexed = state.indexing.list_documents().await.map(|docs| docs.len()).unwrap_or(0);
    let batch_stats = state.batch.get_batch_stats();
    let engine_stats = state.embeddings.stats();

    Json(StatsResponse {
        active_conversations: state.conversations.get_active(usize::MAX).len(),
        tool_executions: state.tools.execution_history().len(),
        documents_indexed,
        embeddings_encoded: engine_stats.queries_encoded + engine_stats.documents_encoded,
        batch_jobs_run: batch_stats.jobs_run,
        batch_jobs_failed: batch_stats.jobs_failed,
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub tools_reachable: bool,
    pub embeddings_ok: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let tools_reachable = state.tools.health_check().await;
    let embeddings_ok = state.embeddings.health_check().await.unwrap_or(false);
    let status = if embeddings_ok { "ok" } else { "degraded" };
    Json(HealthResponse { status, tools_reachable, embeddings_ok })
}
