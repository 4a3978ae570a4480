//! ToolDispatcher (C11): registry, schema validation, rate limiting,
//! response caching, bounded concurrency, and retry for remote business-API
//! calls.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use uuid::Uuid;

use sa_domain::config::ToolDispatcherConfig;
use sa_domain::error::{Error, Result};
use sa_domain::tool::{HttpMethod, ParameterSpec, ParameterType, ToolAuth, ToolDefinition, ToolExecutionRecord};
use sa_domain::trace::TraceEvent;

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

struct RateWindow {
    calls: Vec<Instant>,
}

#[derive(Default)]
struct State {
    definitions: HashMap<String, ToolDefinition>,
    rate_windows: HashMap<String, RateWindow>,
    cache: HashMap<String, CacheEntry>,
    history: Vec<ToolExecutionRecord>,
}

/// Registry and executor for remote business-API calls.
pub struct ToolDispatcher {
    config: ToolDispatcherConfig,
    state: RwLock<State>,
    semaphore: Arc<Semaphore>,
    http: reqwest::Client,
}

impl ToolDispatcher {
    pub fn new(config: ToolDispatcherConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_requests));
        Self { config, state: RwLock::new(State::default()), semaphore, http: reqwest::Client::new() }
    }

    pub fn register(&self, definition: ToolDefinition) {
        self.state.write().definitions.insert(definition.name.clone(), definition);
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.state.read().definitions.values().cloned().collect()
    }

    pub fn execution_history(&self) -> Vec<ToolExecutionRecord> {
        self.state.read().history.clone()
    }

    /// Probe every distinct backend's `/health`; healthy if any responds.
    pub async fn health_check(&self) -> bool {
        let bases: std::collections::HashSet<String> = {
            let state = self.state.read();
            state.definitions.values().map(|d| base_url(&d.endpoint)).collect()
        };
        for base in bases {
            let url = format!("{base}/health");
            let resp = self.http.get(&url).timeout(Duration::from_secs(5)).send().await;
            if matches!(resp, Ok(r) if r.status().is_success()) {
                return true;
            }
        }
        false
    }

    pub async fn execute_tool(&self, name: &str, params: HashMap<String, Value>) -> Result<Value> {
        let started = Instant::now();
        let definition = {
            let state = self.state.read();
            state.definitions.get(name).cloned()
        }
        .ok_or_else(|| Error::NotFound(format!("tool '{name}'")))?;

        self.check_rate_limit(name, definition.rate_limit_per_minute)?;
        validate_params(&definition, &params)?;

        let cache_key = hash_call(name, &params);
        if definition.cache_ttl_secs > 0 {
            if let Some(cached) = self.cache_get(&cache_key) {
                debug!(tool = name, "cache hit");
                return Ok(cached);
            }
        }

        let _permit = self.semaphore.acquire().await.map_err(|_| Error::Other("semaphore closed".into()))?;

        let retries = std::sync::atomic::AtomicU32::new(0);
        let result = self.execute_with_retry(&definition, params.clone(), &retries).await;

        let record = ToolExecutionRecord {
            execution_id: Uuid::new_v4().to_string(),
            tool_name: name.to_string(),
            parameters: serde_json::to_value(&params).unwrap_or(Value::Null),
            result: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(|e| e.to_string()),
            execution_time_ms: started.elapsed().as_millis() as u64,
            success: result.is_ok(),
            timestamp: Utc::now(),
        };
        self.record_execution(record, retries.load(std::sync::atomic::Ordering::Relaxed));

        if let Ok(value) = &result {
            if definition.cache_ttl_secs > 0 {
                self.cache_put(cache_key, value.clone(), definition.cache_ttl_secs);
            }
        }

        result
    }

    fn check_rate_limit(&self, name: &str, limit_per_minute: u32) -> Result<()> {
        let now = Instant::now();
        let window = Duration::from_secs(60);
        let mut state = self.state.write();
        let entry = state.rate_windows.entry(name.to_string()).or_insert_with(|| RateWindow { calls: Vec::new() });
        entry.calls.retain(|t| now.duration_since(*t) < window);
        if entry.calls.len() as u32 >= limit_per_minute {
            TraceEvent::ToolRateLimited { tool_name: name.to_string(), calls_in_window: entry.calls.len() as u32 }.emit();
            return Err(Error::RateLimited(format!("tool '{name}' rate limit exceeded")));
        }
        entry.calls.push(now);
        Ok(())
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        let state = self.state.read();
        let entry = state.cache.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn cache_put(&self, key: String, value: Value, ttl_secs: u64) {
        let mut state = self.state.write();
        if state.cache.len() >= 10_000 {
            if let Some(oldest_key) = state.cache.keys().next().cloned() {
                state.cache.remove(&oldest_key);
            }
        }
        state.cache.insert(key, CacheEntry { value, expires_at: Instant::now() + Duration::from_secs(ttl_secs) });
    }

    fn record_execution(&self, record: ToolExecutionRecord, retries: u32) {
        TraceEvent::ToolExecuted {
            execution_id: record.execution_id.clone(),
            tool_name: record.tool_name.clone(),
            success: record.success,
            duration_ms: record.execution_time_ms,
            retries,
        }
        .emit();

        let mut state = self.state.write();
        state.history.push(record);
        if state.history.len() > self.config.execution_history_capacity {
            let keep_from = state.history.len() - self.config.execution_history_capacity / 2;
            state.history.drain(..keep_from);
        }
    }

    async fn execute_with_retry(&self, definition: &ToolDefinition, mut params: HashMap<String, Value>, retries: &std::sync::atomic::AtomicU32) -> Result<Value> {
        let (endpoint, path_params) = substitute_path_params(&definition.endpoint, &params);
        for key in &path_params {
            params.remove(key);
        }

        let mut attempt = 0;
        loop {
            let mut request = match definition.method {
                HttpMethod::Get | HttpMethod::Delete => {
                    let method = if matches!(definition.method, HttpMethod::Get) { reqwest::Method::GET } else { reqwest::Method::DELETE };
                    self.http.request(method, &endpoint).query(&params)
                }
                HttpMethod::Post => self.http.post(&endpoint).json(&params),
                HttpMethod::Put => self.http.put(&endpoint).json(&params),
                HttpMethod::Patch => self.http.patch(&endpoint).json(&params),
            };
            request = request.timeout(Duration::from_secs(definition.timeout_secs));
            request = attach_auth(request, definition.auth.as_ref());

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response.text().await.unwrap_or_default();
                        return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
                    }
                    if status.is_client_error() {
                        return Err(Error::Upstream(format!("{} returned {status}", definition.display_name())));
                    }
                    if attempt >= definition.retry_count {
                        return Err(Error::Upstream(format!("{} returned {status} after {attempt} retries", definition.display_name())));
                    }
                }
                Err(e) if e.is_timeout() => {
                    if attempt >= definition.retry_count {
                        return Err(Error::Timeout(format!("{} timed out", definition.display_name())));
                    }
                }
                Err(e) => {
                    if attempt >= definition.retry_count {
                        return Err(Error::Upstream(format!("{}: {e}", definition.display_name())));
                    }
                }
            }
            warn!(tool = %definition.name, attempt, "retrying after transport error or 5xx");
            tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
            attempt += 1;
            retries.store(attempt, std::sync::atomic::Ordering::Relaxed);
        }
    }
}

fn base_url(endpoint: &str) -> String {
    if let Ok(url) = reqwest::Url::parse(endpoint) {
        format!("{}://{}", url.scheme(), url.host_str().unwrap_or(""))
    } else {
        endpoint.to_string()
    }
}

fn hash_call(name: &str, params: &HashMap<String, Value>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    for key in keys {
        hasher.update(key.as_bytes());
        hasher.update(params[key].to_string().as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn substitute_path_params(endpoint: &str, params: &HashMap<String, Value>) -> (String, Vec<String>) {
    let mut result = endpoint.to_string();
    let mut used = Vec::new();
    for (key, value) in params {
        let placeholder = format!("{{{key}}}");
        if result.contains(&placeholder) {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            result = result.replace(&placeholder, &rendered);
            used.push(key.clone());
        }
    }
    (result, used)
}

fn attach_auth(request: reqwest::RequestBuilder, auth: Option<&ToolAuth>) -> reqwest::RequestBuilder {
    match auth {
        Some(ToolAuth::Bearer { token_env }) => {
            let token = std::env::var(token_env).unwrap_or_default();
            request.bearer_auth(token)
        }
        Some(ToolAuth::ApiKey { header, token_env }) => {
            let token = std::env::var(token_env).unwrap_or_default();
            request.header(header.as_str(), token)
        }
        None => request,
    }
}

fn validate_params(definition: &ToolDefinition, params: &HashMap<String, Value>) -> Result<()> {
    for required in &definition.required_parameters {
        if !params.contains_key(required) {
            return Err(Error::Validation(format!("missing required parameter '{required}'")));
        }
    }
    for (key, spec) in &definition.parameter_schema {
        let Some(value) = params.get(key) else { continue };
        if !type_matches(value, &spec.param_type) {
            return Err(Error::Validation(format!("parameter '{key}' has wrong type, expected {:?}", spec.param_type)));
        }
        if let Some(enum_values) = &spec.enum_values {
            if let Value::String(s) = value {
                if !enum_values.contains(s) {
                    return Err(Error::Validation(format!("parameter '{key}' must be one of {enum_values:?}")));
                }
            }
        }
    }
    Ok(())
}

fn type_matches(value: &Value, expected: &ParameterType) -> bool {
    match expected {
        ParameterType::String => value.is_string(),
        ParameterType::Integer => value.is_i64() || value.is_u64(),
        ParameterType::Boolean => value.is_boolean(),
        ParameterType::Array => value.is_array(),
        ParameterType::Object => value.is_object(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sa_domain::tool::ServiceType;

    fn def(name: &str) -> ToolDefinition {
        let mut schema = HashMap::new();
        schema.insert("name".to_string(), ParameterSpec { param_type: ParameterType::String, required: true, enum_values: None, default: None });
        ToolDefinition {
            name: name.to_string(),
            service_type: ServiceType::Crm,
            endpoint: "http://localhost:9999/contacts".into(),
            method: HttpMethod::Post,
            parameter_schema: schema,
            required_parameters: vec!["name".to_string()],
            timeout_secs: 1,
            retry_count: 0,
            cache_ttl_secs: 0,
            rate_limit_per_minute: 2,
            auth: None,
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let dispatcher = ToolDispatcher::new(ToolDispatcherConfig::default());
        let err = dispatcher.execute_tool("missing", HashMap::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn missing_required_parameter_is_rejected() {
        let dispatcher = ToolDispatcher::new(ToolDispatcherConfig::default());
        dispatcher.register(def("create_crm_contact"));
        let err = dispatcher.execute_tool("create_crm_contact", HashMap::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn rate_limit_trips_after_configured_calls() {
        let dispatcher = ToolDispatcher::new(ToolDispatcherConfig::default());
        dispatcher.register(def("create_crm_contact"));
        let mut params = HashMap::new();
        params.insert("name".to_string(), Value::String("Jane".into()));
        let _ = dispatcher.execute_tool("create_crm_contact", params.clone()).await;
        let _ = dispatcher.execute_tool("create_crm_contact", params.clone()).await;
        let err = dispatcher.execute_tool("create_crm_contact", params).await.unwrap_err();
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn path_param_substitution_removes_used_keys() {
        let mut params = HashMap::new();
        params.insert("id".to_string(), Value::String("42".into()));
        params.insert("name".to_string(), Value::String("Jane".into()));
        let (endpoint, used) = substitute_path_params("/contacts/{id}", &params);
        assert_eq!(endpoint, "/contacts/42");
        assert_eq!(used, vec!["id".to_string()]);
    }
}
