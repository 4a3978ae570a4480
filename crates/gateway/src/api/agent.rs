//! `POST /agent` and `POST /agent/stream` — run one orchestrator turn.

use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sa_domain::stream::DONE_MARKER;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub text: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub conversation_id: String,
    pub actions: Vec<Value>,
    pub response: String,
    pub reasoning: Option<Vec<String>>,
    pub confidence: Option<f32>,
    pub processing_time: f64,
}

pub async fn agent(State(state): State<AppState>, Json(req): Json<AgentRequest>) -> ApiResult<Json<AgentResponse>> {
    let started = Instant::now();
    let conversation_id = req.conversation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let conv_state = state.orchestrator.run(&conversation_id, req.user_id, &req.text).await?;

    let actions = conv_state
        .actions_taken
        .iter()
        .map(|a| {
            serde_json::json!({
                "tool_name": a.tool_name,
                "parameters": a.parameters,
                "success": a.success,
                "result": a.result,
                "error": a.error,
            })
        })
        .collect();

    Ok(Json(AgentResponse {
        conversation_id,
        actions,
        response: conv_state.response.clone().unwrap_or_default(),
        reasoning: Some(conv_state.reasoning.clone()),
        confidence: Some(conv_state.intent_confidence),
        processing_time: started.elapsed().as_secs_f64(),
    }))
}

pub async fn agent_stream(State(state): State<AppState>, Json(req): Json<AgentRequest>) -> Response {
    let conversation_id = req.conversation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let frames = state.orchestrator.clone().run_streaming(conversation_id, req.user_id, req.text);

    let body_stream = frames
        .map(|frame| Ok::<_, std::convert::Infallible>(axum::body::Bytes::from(frame.to_sse())))
        .chain(futures_util::stream::once(async { Ok(axum::body::Bytes::from(DONE_MARKER)) }));

    let mut response = Response::new(Body::from_stream(body_stream));
    response.headers_mut().insert(axum::http::header::CONTENT_TYPE, "text/event-stream".parse().unwrap());
    response.headers_mut().insert(axum::http::header::CACHE_CONTROL, "no-cache".parse().unwrap());
    response.into_response()
}
