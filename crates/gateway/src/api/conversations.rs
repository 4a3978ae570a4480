//! `GET /conversations/{id}`, `POST /conversations/{id}/messages`,
//! `DELETE /conversations/{id}` — conversation history management.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use sa_domain::conversation::{ConversationSummary, MessageRole};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_conversation(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<ConversationSummary>> {
    let summary = state.conversations.get_summary(&id).await?;
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    #[serde(default = "default_role")]
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub tools_used: Vec<String>,
}

fn default_role() -> MessageRole {
    MessageRole::User
}

#[derive(Debug, Serialize)]
pub struct AddMessageResponse {
    pub message_id: String,
    pub sequence: u64,
}

pub async fn add_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddMessageRequest>,
) -> ApiResult<Json<AddMessageResponse>> {
    let message = state.conversations.add_message(&id, req.role, req.content, req.intent, req.confidence, req.tools_used).await?;
    Ok(Json(AddMessageResponse { message_id: message.message_id, sequence: message.sequence }))
}

pub async fn delete_conversation(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.conversations.delete(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
