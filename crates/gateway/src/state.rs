//! Shared application state handed to every axum handler.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use sa_batch::BatchProcessor;
use sa_citations::CitationGenerator;
use sa_domain::config::Config;
use sa_domain::llm::LlmClient;
use sa_embeddings::EmbeddingEngine;
use sa_indexing::IndexingManager;
use sa_nlu::{EntityExtractor, IntentClassifier};
use sa_orchestrator::Orchestrator;
use sa_search::HybridSearch;
use sa_sessions::ConversationManager;
use sa_tools::ToolDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conversations: Arc<ConversationManager>,
    pub tools: Arc<ToolDispatcher>,
    pub orchestrator: Arc<Orchestrator>,
    pub search: Arc<HybridSearch>,
    pub citations: Arc<CitationGenerator>,
    pub indexing: Arc<IndexingManager>,
    pub batch: Arc<BatchProcessor>,
    pub embeddings: Arc<EmbeddingEngine>,
    pub intent_classifier: Arc<IntentClassifier>,
    pub entity_extractor: Arc<EntityExtractor>,
    pub llm: Arc<dyn LlmClient>,
    pub started_at: DateTime<Utc>,
}
