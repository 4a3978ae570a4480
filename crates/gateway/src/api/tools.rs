//! `GET /tools` and `POST /tools/execute` — introspect and directly invoke
//! registered business-API tools.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sa_domain::tool::ToolDefinition;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    Json(state.tools.definitions())
}

#[derive(Debug, Deserialize)]
pub struct ExecuteToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteToolResponse {
    pub result: Value,
}

pub async fn execute_tool(State(state): State<AppState>, Json(req): Json<ExecuteToolRequest>) -> ApiResult<Json<ExecuteToolResponse>> {
    let result = state.tools.execute_tool(&req.tool_name, req.parameters).await?;
    Ok(Json(ExecuteToolResponse { result }))
}
