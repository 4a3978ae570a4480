//! `POST /nlu` — standalone intent classification and entity extraction.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use sa_domain::entity::Entity;
use sa_domain::intent::IntentScore;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NluRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub classify_intent: bool,
    #[serde(default = "default_true")]
    pub extract_entities: bool,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct NluResponse {
    pub text: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentPayload>,
    pub entities: Vec<Entity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub processing_time: f64,
}

#[derive(Debug, Serialize)]
pub struct IntentPayload {
    pub name: String,
    pub confidence: f32,
    pub alternatives: Vec<IntentScore>,
}

pub async fn nlu(State(state): State<AppState>, Json(req): Json<NluRequest>) -> ApiResult<Json<NluResponse>> {
    let started = Instant::now();

    let intent = if req.classify_intent {
        state.intent_classifier.classify(&req.text, &req.language).map(|r| IntentPayload {
            name: r.intent,
            confidence: r.confidence,
            alternatives: r.alternatives,
        })
    } else {
        None
    };

    let entities = if req.extract_entities { state.entity_extractor.extract(&req.text) } else { Vec::new() };

    Ok(Json(NluResponse {
        text: req.text,
        language: req.language,
        intent,
        entities,
        conversation_id: req.conversation_id,
        processing_time: started.elapsed().as_secs_f64(),
    }))
}
