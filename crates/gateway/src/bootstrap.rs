//! Wires every component crate into a running [`AppState`], matching the
//! collaborator graph in spec.md §3: embeddings -> docproc -> search ->
//! citations, indexing, batch, sessions, tools, nlu, and the orchestrator
//! that ties them together.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use sa_batch::{BatchProcessor, BatchProcessorConfig, StaticConnector};
use sa_citations::{CitationGenerator, CitationGeneratorConfig};
use sa_docproc::{ChunkingConfig, DocumentProcessor};
use sa_domain::config::Config;
use sa_domain::llm::LlmClient;
use sa_domain::search::VectorIndex;
use sa_embeddings::{EmbeddingEngine, EmbeddingEngineConfig, HashInferenceBackend};
use sa_indexing::{IndexingManager, IndexingManagerConfig, InMemoryIndexingStore};
use sa_nlu::{default_definitions, EntityExtractor, EntityExtractorConfig, IntentClassifier};
use sa_orchestrator::Orchestrator;
use sa_search::{HybridSearch, HybridSearchConfig, InMemoryVectorIndex, SparseIndex};
use sa_sessions::{ConversationManager, ConversationManagerConfig, InMemoryHistoryStore};
use sa_tools::ToolDispatcher;

use crate::llm_client::HttpLlmClient;
use crate::state::AppState;
use crate::tool_registry::default_tool_definitions;

/// Everything `bootstrap` started that needs a graceful shutdown: the
/// indexing worker pool, the batch scheduler, and the conversation
/// eviction task.
pub struct Background {
    pub token: CancellationToken,
    pub handles: Vec<JoinHandle<()>>,
}

pub fn bootstrap(config: Config) -> (AppState, Background) {
    let config = Arc::new(config);
    let token = CancellationToken::new();
    let mut handles = Vec::new();

    // ── Sessions (C10) ────────────────────────────────────────────────
    let history = Arc::new(InMemoryHistoryStore::new());
    let conversations = Arc::new(ConversationManager::new(
        ConversationManagerConfig {
            cleanup_interval: std::time::Duration::from_secs(config.sessions.cleanup_interval_secs),
            eviction_after: chrono::Duration::seconds(config.sessions.eviction_after_secs),
        },
        history,
    ));
    handles.push(conversations.spawn_eviction_task(token.clone()));
    info!("conversation manager ready");

    // ── Tool dispatcher (C11) ────────────────────────────────────────
    let tools = Arc::new(ToolDispatcher::new(config.tools.dispatcher.clone()));
    for definition in default_tool_definitions() {
        tools.register(definition);
    }
    info!(tool_count = tools.definitions().len(), "tool dispatcher ready");

    // ── Embeddings (C1) ───────────────────────────────────────────────
    let embeddings = Arc::new(EmbeddingEngine::new(
        EmbeddingEngineConfig { dimension: config.embeddings.dimensions, batch_size: config.embeddings.batch_size, ..EmbeddingEngineConfig::default() },
        Arc::new(HashInferenceBackend::new(config.embeddings.dimensions)),
    ));
    info!(dimension = embeddings.dimension(), "embedding engine ready");

    // ── Document processor (C2) ──────────────────────────────────────
    let processor = Arc::new(DocumentProcessor::new(ChunkingConfig::default()));

    // ── Search (C3, C4) ───────────────────────────────────────────────
    let vector_index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new());
    let sparse_index = Arc::new(SparseIndex::new());
    let search = Arc::new(HybridSearch::new(
        HybridSearchConfig { dense_weight: config.search.dense_weight, sparse_weight: config.search.sparse_weight },
        embeddings.clone(),
        vector_index.clone(),
        sparse_index.clone(),
    ));
    info!("hybrid search ready");

    // ── Citations (C5) ────────────────────────────────────────────────
    let citations = Arc::new(CitationGenerator::new(CitationGeneratorConfig {
        format: parse_format(&config.citations.format),
        style: parse_style(&config.citations.style),
        max_citations: config.citations.max_citations,
    }));

    // ── Indexing (C6) ─────────────────────────────────────────────────
    let indexing_store = Arc::new(InMemoryIndexingStore::new());
    let indexing = Arc::new(IndexingManager::new(
        IndexingManagerConfig {
            worker_count: config.indexing.worker_count,
            max_retries: config.indexing.max_retries,
            ..IndexingManagerConfig::default()
        },
        indexing_store,
        processor,
        embeddings.clone(),
        vector_index.clone(),
    ));
    handles.extend(indexing.spawn_workers(token.clone()));
    info!(worker_count = config.indexing.worker_count, "indexing manager ready");

    // ── Batch sync (C7) ───────────────────────────────────────────────
    // No CRM/ERP system is wired in by default (spec.md §1 Non-goals);
    // operators register real data sources via `BatchProcessor::register_data_source`.
    let connector = Arc::new(StaticConnector::new(Vec::new()));
    let batch = Arc::new(BatchProcessor::new(
        BatchProcessorConfig { max_concurrent_jobs: config.batch.max_concurrent_jobs, ..BatchProcessorConfig::default() },
        connector,
        indexing.clone(),
    ));
    handles.push(batch.spawn_scheduler(token.clone()));
    info!("batch processor ready");

    // ── NLU (C8, C9) ──────────────────────────────────────────────────
    let intent_classifier = Arc::new(IntentClassifier::new(default_definitions()));
    let entity_extractor = Arc::new(EntityExtractor::new(EntityExtractorConfig { min_confidence: config.nlu.min_entity_confidence }));
    info!("intent classifier + entity extractor ready");

    // ── LLM collaborator (C13) ───────────────────────────────────────
    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(&config.llm));
    let llm_for_orchestrator = llm.clone();

    // ── Orchestrator (C12) ────────────────────────────────────────────
    let orchestrator = Arc::new(Orchestrator::new(
        config.orchestrator.clone(),
        config.llm.clone(),
        IntentClassifier::new(default_definitions()),
        EntityExtractor::new(EntityExtractorConfig { min_confidence: config.nlu.min_entity_confidence }),
        conversations.clone(),
        tools.clone(),
        search.clone(),
        llm_for_orchestrator,
    ));
    info!("orchestrator ready");

    let state = AppState {
        config,
        conversations,
        tools,
        orchestrator,
        search,
        citations,
        indexing,
        batch,
        embeddings,
        intent_classifier,
        entity_extractor,
        llm,
        started_at: chrono::Utc::now(),
    };

    (state, Background { token, handles })
}

fn parse_format(s: &str) -> sa_domain::citation::CitationFormat {
    use sa_domain::citation::CitationFormat::*;
    match s {
        "mla" => Mla,
        "chicago" => Chicago,
        "ieee" => Ieee,
        "harvard" => Harvard,
        "simple" => Simple,
        _ => Apa,
    }
}

fn parse_style(s: &str) -> sa_domain::citation::CitationStyle {
    use sa_domain::citation::CitationStyle::*;
    match s {
        "inline" => Inline,
        _ => Numbered,
    }
}
