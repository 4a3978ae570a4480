//! Business-API tool types shared by the tool dispatcher (C11) and the
//! orchestrator's tool-selection step.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Crm,
    Erp,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

/// One field's shape in a [`ToolDefinition`]'s parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

/// Auth attached to a tool's outbound HTTP call. The env var is resolved at
/// call time, never persisted alongside the definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolAuth {
    Bearer { token_env: String },
    ApiKey { header: String, token_env: String },
}

/// Immutable, registered description of a remote business-API call. Created
/// once at registration time and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub service_type: ServiceType,
    /// May contain `{field}` path placeholders substituted from parameters.
    pub endpoint: String,
    pub method: HttpMethod,
    pub parameter_schema: HashMap<String, ParameterSpec>,
    pub required_parameters: Vec<String>,
    pub timeout_secs: u64,
    pub retry_count: u32,
    pub cache_ttl_secs: u64,
    pub rate_limit_per_minute: u32,
    #[serde(default)]
    pub auth: Option<ToolAuth>,
}

impl ToolDefinition {
    /// Human-readable name used in user-facing failure messages
    /// ("the Create Crm Contact tool is unavailable").
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

/// Append-only record of a single tool invocation, kept in a bounded ring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    pub execution_id: String,
    pub tool_name: String,
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// An orchestrator-selected tool invocation awaiting execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSelection {
    pub tool_name: String,
    pub parameters: HashMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_replaces_underscores() {
        let def = ToolDefinition {
            name: "create_crm_contact".into(),
            service_type: ServiceType::Crm,
            endpoint: "/contacts".into(),
            method: HttpMethod::Post,
            parameter_schema: HashMap::new(),
            required_parameters: vec![],
            timeout_secs: 30,
            retry_count: 3,
            cache_ttl_secs: 0,
            rate_limit_per_minute: 60,
            auth: None,
        };
        assert_eq!(def.display_name(), "create crm contact");
    }
}
