//! Configuration loaded from `config.toml` (or defaults if absent). One
//! struct per component, each independently deserializable with field
//! defaults so a partial config file only overrides what it names.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub citations: CitationsConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub nlu: NluConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Server
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_3210")]
    pub port: u16,
    #[serde(default = "d_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: d_host(), port: d_3210(), cors_origins: d_cors_origins() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ConversationManager (C10)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// How often the idle-eviction sweep runs (seconds).
    #[serde(default = "d_300")]
    pub cleanup_interval_secs: u64,
    /// In-memory `ConversationContext` eviction threshold (seconds).
    #[serde(default = "d_3600")]
    pub eviction_after_secs: i64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self { cleanup_interval_secs: d_300(), eviction_after_secs: d_3600() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ToolDispatcher (C11)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub dispatcher: ToolDispatcherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDispatcherConfig {
    #[serde(default = "d_30")]
    pub default_timeout_secs: u64,
    #[serde(default = "d_10")]
    pub max_concurrent_requests: usize,
    /// Bound on the execution-history ring; halved on overflow.
    #[serde(default = "d_1000u")]
    pub execution_history_capacity: usize,
}

impl Default for ToolDispatcherConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: d_30(),
            max_concurrent_requests: d_10(),
            execution_history_capacity: d_1000u(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EmbeddingEngine (C4)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "d_384")]
    pub dimensions: usize,
    #[serde(default = "d_32u")]
    pub batch_size: usize,
    #[serde(default = "d_true")]
    pub cache_enabled: bool,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self { dimensions: d_384(), batch_size: d_32u(), cache_enabled: d_true() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HybridSearch (C5)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "d_05")]
    pub dense_weight: f32,
    #[serde(default = "d_05")]
    pub sparse_weight: f32,
    #[serde(default = "d_default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "d_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dense_weight: d_05(),
            sparse_weight: d_05(),
            default_top_k: d_default_top_k(),
            similarity_threshold: d_similarity_threshold(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CitationGenerator (C_citations)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationsConfig {
    #[serde(default = "d_10u")]
    pub max_citations: usize,
    #[serde(default = "d_format")]
    pub format: String,
    #[serde(default = "d_style")]
    pub style: String,
}

impl Default for CitationsConfig {
    fn default() -> Self {
        Self { max_citations: d_10u(), format: d_format(), style: d_style() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IndexingManager (C6)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "d_4u")]
    pub worker_count: usize,
    #[serde(default = "d_3u")]
    pub max_retries: u32,
    #[serde(default = "d_5")]
    pub poll_interval_secs: u64,
    #[serde(default = "d_300000u")]
    pub shutdown_timeout_secs: u64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            worker_count: d_4u(),
            max_retries: d_3u() as u32,
            poll_interval_secs: d_5(),
            shutdown_timeout_secs: d_300000u(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BatchProcessor (C7)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "d_2u")]
    pub max_concurrent_jobs: usize,
    #[serde(default = "d_scheduler_tick_secs")]
    pub scheduler_tick_secs: u64,
    #[serde(default = "d_30u")]
    pub retention_days: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: d_2u(),
            scheduler_tick_secs: d_scheduler_tick_secs(),
            retention_days: d_30u() as i64,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IntentClassifier / EntityExtractor (C8, C9)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    #[serde(default = "d_min_confidence")]
    pub min_entity_confidence: f32,
    #[serde(default = "d_min_confidence")]
    pub min_intent_confidence: f32,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self { min_entity_confidence: d_min_confidence(), min_intent_confidence: d_min_confidence() }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator (C12)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "d_3u")]
    pub max_retries: u32,
    #[serde(default = "d_5u")]
    pub history_window: usize,
    #[serde(default = "d_3u")]
    pub rag_snippet_count: usize,
    #[serde(default = "d_top_k")]
    pub rag_top_k: usize,
    #[serde(default = "d_similarity_threshold")]
    pub rag_similarity_threshold: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: d_3u() as u32,
            history_window: d_5u(),
            rag_snippet_count: d_3u(),
            rag_top_k: d_top_k(),
            rag_similarity_threshold: d_similarity_threshold(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM collaborator (C13)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "d_60")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_key_env: None,
            temperature: d_temperature(),
            max_tokens: d_max_tokens(),
            timeout_secs: d_60(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Default-value helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_3210() -> u16 {
    3210
}
fn d_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
fn d_300() -> u64 {
    300
}
fn d_3600() -> i64 {
    3600
}
fn d_30() -> u64 {
    30
}
fn d_60() -> u64 {
    60
}
fn d_10() -> usize {
    10
}
fn d_1000u() -> usize {
    1000
}
fn d_384() -> usize {
    384
}
fn d_32u() -> usize {
    32
}
fn d_true() -> bool {
    true
}
fn d_05() -> f32 {
    0.5
}
fn d_default_top_k() -> usize {
    10
}
fn d_top_k() -> usize {
    5
}
fn d_similarity_threshold() -> f32 {
    0.7
}
fn d_10u() -> usize {
    10
}
fn d_format() -> String {
    "apa".into()
}
fn d_style() -> String {
    "numbered".into()
}
fn d_4u() -> usize {
    4
}
fn d_3u() -> usize {
    3
}
fn d_5() -> u64 {
    5
}
fn d_5u() -> usize {
    5
}
fn d_300000u() -> u64 {
    300
}
fn d_2u() -> usize {
    2
}
fn d_scheduler_tick_secs() -> u64 {
    60
}
fn d_30u() -> usize {
    30
}
fn d_min_confidence() -> f32 {
    0.5
}
fn d_base_url() -> String {
    "http://localhost:8080".into()
}
fn d_temperature() -> f32 {
    0.7
}
fn d_max_tokens() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let raw = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
    }

    #[test]
    fn partial_toml_falls_back_to_field_defaults() {
        let parsed: Config = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(parsed.server.port, 9000);
        assert_eq!(parsed.server.host, d_host());
        assert_eq!(parsed.orchestrator.max_retries, 3);
    }
}
