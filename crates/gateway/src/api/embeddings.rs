//! `POST /embeddings` — raw text-to-vector encoding, bypassing search.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sa_domain::error::Error;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmbeddingsRequest {
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub model: &'static str,
    pub dimension: usize,
}

pub async fn embeddings(State(state): State<AppState>, Json(req): Json<EmbeddingsRequest>) -> ApiResult<Json<EmbeddingsResponse>> {
    if req.texts.is_empty() {
        return Err(ApiError(Error::Validation("texts must not be empty".into())));
    }
    let vectors = state.embeddings.encode_documents(&req.texts).await?;
    Ok(Json(EmbeddingsResponse { dimension: state.embeddings.dimension(), embeddings: vectors, model: "sa-embeddings" }))
}
