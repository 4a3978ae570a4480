//! `POST /search` — direct hybrid/dense/sparse retrieval, no RAG synthesis.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sa_domain::search::{SearchFilters, SearchResult, SearchType};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_search_type")]
    pub search_type: SearchType,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

fn default_top_k() -> usize {
    10
}
fn default_search_type() -> SearchType {
    SearchType::Hybrid
}
fn default_threshold() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub processing_time: f64,
}

pub async fn search(State(state): State<AppState>, Json(mut req): Json<SearchRequest>) -> ApiResult<Json<SearchResponse>> {
    let started = Instant::now();
    let filters = req.filters.take().unwrap_or_default();

    let mut results = state.search.search(&req.query, req.top_k, req.search_type, req.similarity_threshold, &filters).await?;
    if !req.include_metadata {
        for result in &mut results {
            result.metadata.clear();
        }
    }

    Ok(Json(SearchResponse {
        total_results: results.len(),
        query: req.query,
        results,
        processing_time: started.elapsed().as_secs_f64(),
    }))
}
