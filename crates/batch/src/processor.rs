//! BatchProcessor (C7): scheduled ingestion of external CRM/ERP sources.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use parking_lot::RwLock;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sa_domain::batch::{BatchJob, BatchJobStatus, BatchJobType, BatchStats, DataSource};
use sa_domain::error::{Error, Result};
use sa_domain::trace::TraceEvent;
use sa_indexing::IndexingManager;

use crate::connector::DataSourceConnector;

#[derive(Debug, Clone)]
pub struct BatchProcessorConfig {
    pub max_concurrent_jobs: usize,
    pub job_retention: chrono::Duration,
    pub scheduler_tick: Duration,
    pub incremental_baseline: chrono::Duration,
}

impl Default for BatchProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            job_retention: chrono::Duration::days(7),
            scheduler_tick: Duration::from_secs(60),
            incremental_baseline: chrono::Duration::hours(24),
        }
    }
}

struct State {
    sources: HashMap<String, DataSource>,
    jobs: HashMap<String, BatchJob>,
    created_recurring: HashSet<String>,
    stats: BatchStats,
}

pub struct BatchProcessor {
    config: BatchProcessorConfig,
    state: RwLock<State>,
    connector: Arc<dyn DataSourceConnector>,
    indexing: Arc<IndexingManager>,
}

impl BatchProcessor {
    pub fn new(config: BatchProcessorConfig, connector: Arc<dyn DataSourceConnector>, indexing: Arc<IndexingManager>) -> Self {
        Self {
            config,
            state: RwLock::new(State { sources: HashMap::new(), jobs: HashMap::new(), created_recurring: HashSet::new(), stats: BatchStats::default() }),
            connector,
            indexing,
        }
    }

    pub fn register_data_source(&self, source: DataSource) {
        self.state.write().sources.insert(source.name.clone(), source);
    }

    pub fn get_batch_stats(&self) -> BatchStats {
        self.state.read().stats.clone()
    }

    pub fn list_jobs(&self) -> Vec<BatchJob> {
        self.state.read().jobs.values().cloned().collect()
    }

    /// Schedule a job for `source_name` to run immediately, bypassing the
    /// normal promotion cadence.
    pub async fn trigger_immediate_sync(&self, source_name: &str, job_type: BatchJobType) -> Result<String> {
        let source_system = {
            let state = self.state.read();
            if !state.sources.contains_key(source_name) {
                return Err(Error::NotFound(format!("data source '{source_name}'")));
            }
            source_name.to_string()
        };
        let job = BatchJob::new(uuid::Uuid::new_v4().to_string(), job_type, source_system, Utc::now());
        let job_id = job.id.clone();
        self.state.write().jobs.insert(job_id.clone(), job);
        self.execute_job(&job_id).await;
        Ok(job_id)
    }

    /// Spawn the once-a-minute scheduler loop.
    pub fn spawn_scheduler(self: &Arc<Self>, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        let processor = Arc::clone(self);
        tokio::spawn(async move { processor.run_scheduler(token).await })
    }

    async fn run_scheduler(&self, token: CancellationToken) {
        let mut ticker = interval(self.config.scheduler_tick);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("batch scheduler shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.create_recurring_jobs();
                    self.promote_due_jobs().await;
                    self.delete_old_jobs();
                }
            }
        }
    }

    /// Create today's daily 02:00 incremental and Sunday 01:00 full-sync
    /// jobs, idempotently keyed by (source, type, date).
    fn create_recurring_jobs(&self) {
        let now = Utc::now();
        let mut state = self.state.write();
        let sources: Vec<DataSource> = state.sources.values().cloned().collect();

        for source in sources {
            if !source.enabled {
                continue;
            }

            if now.hour() == 2 {
                self.maybe_create_recurring(&mut state, &source, BatchJobType::IncrementalSync, now);
            }
            if source.sync_frequency == sa_domain::batch::SyncFrequency::Weekly && now.weekday() == Weekday::Sun && now.hour() == 1 {
                self.maybe_create_recurring(&mut state, &source, BatchJobType::FullSync, now);
            }
        }
    }

    fn maybe_create_recurring(&self, state: &mut State, source: &DataSource, job_type: BatchJobType, now: DateTime<Utc>) {
        let key = format!("{}|{:?}|{}", source.name, job_type, now.date_naive());
        if state.created_recurring.contains(&key) {
            return;
        }
        let scheduled_time = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let job = BatchJob::new(uuid::Uuid::new_v4().to_string(), job_type, source.name.clone(), scheduled_time);
        state.jobs.insert(job.id.clone(), job);
        state.created_recurring.insert(key);
    }

    async fn promote_due_jobs(&self) {
        let now = Utc::now();
        let running = self.state.read().jobs.values().filter(|j| j.status == BatchJobStatus::Running).count();
        let mut slots = self.config.max_concurrent_jobs.saturating_sub(running);
        if slots == 0 {
            return;
        }

        let due: Vec<String> = {
            let state = self.state.read();
            let mut due: Vec<&BatchJob> = state.jobs.values().filter(|j| j.status == BatchJobStatus::Scheduled && j.scheduled_time <= now).collect();
            due.sort_by_key(|j| j.scheduled_time);
            due.into_iter().map(|j| j.id.clone()).collect()
        };

        for job_id in due {
            if slots == 0 {
                break;
            }
            slots -= 1;
            self.execute_job(&job_id).await;
        }
    }

    fn delete_old_jobs(&self) {
        let cutoff = Utc::now() - self.config.job_retention;
        let mut state = self.state.write();
        state.jobs.retain(|_, job| !(job.status == BatchJobStatus::Completed && job.scheduled_time < cutoff));
    }

    async fn execute_job(&self, job_id: &str) {
        let (source, job_type) = {
            let mut state = self.state.write();
            let Some(job) = state.jobs.get_mut(job_id) else { return };
            job.status = BatchJobStatus::Running;
            let source_name = job.source_system.clone();
            let job_type = job.job_type;
            let Some(source) = state.sources.get(&source_name).cloned() else {
                job.status = BatchJobStatus::Failed;
                job.error_messages.push(format!("unknown data source '{source_name}'"));
                return;
            };
            (source, job_type)
        };

        let result = match job_type {
            BatchJobType::FullSync | BatchJobType::Reindex => self.run_full_sync(&source).await,
            BatchJobType::IncrementalSync => self.run_incremental_sync(&source).await,
            BatchJobType::Cleanup => Ok((0, 0, Vec::new())),
        };

        let mut state = self.state.write();
        let Some(job) = state.jobs.get_mut(job_id) else { return };
        match result {
            Ok((processed, failed, errors)) => {
                job.processed_records = processed;
                job.failed_records = failed;
                job.total_records = processed + failed;
                job.progress = 100;
                job.error_messages.extend(errors);
                job.status = if job.failed_records > 0 && job.processed_records == 0 { BatchJobStatus::Failed } else { BatchJobStatus::Completed };
                state.stats.jobs_run += 1;
                state.stats.records_processed += processed as u64;
                state.stats.records_failed += failed as u64;
                if job.status == BatchJobStatus::Failed {
                    state.stats.jobs_failed += 1;
                }
            }
            Err(e) => {
                error!(job_id, error = %e, "batch job failed outright");
                job.status = BatchJobStatus::Failed;
                job.error_messages.push(e.to_string());
                state.stats.jobs_run += 1;
                state.stats.jobs_failed += 1;
            }
        }

        if let Some(src) = state.sources.get_mut(&job.source_system) {
            src.last_sync = Some(Utc::now());
        }

        TraceEvent::BatchJobCompleted {
            job_id: job.id.clone(),
            job_type: format!("{:?}", job.job_type),
            source: job.source_system.clone(),
            processed: job.processed_records,
            failed: job.failed_records,
        }
        .emit();
    }

    /// Fetch every record for `source`, convert to Documents, and enqueue in
    /// `batch_size` slices via the indexing manager's bulk path. Batch-level
    /// failures accumulate in the returned error list without aborting the
    /// remaining slices.
    async fn run_full_sync(&self, source: &DataSource) -> Result<(usize, usize, Vec<String>)> {
        let documents = self.connector.fetch_all(source).await?;
        self.enqueue_in_batches(documents, source.batch_size).await
    }

    async fn run_incremental_sync(&self, source: &DataSource) -> Result<(usize, usize, Vec<String>)> {
        let since = source.last_sync.unwrap_or_else(|| Utc::now() - self.config.incremental_baseline);
        let documents = self.connector.fetch_incremental(source, since).await?;
        self.enqueue_in_batches(documents, source.batch_size).await
    }

    async fn enqueue_in_batches(&self, documents: Vec<sa_domain::document::Document>, batch_size: usize) -> Result<(usize, usize, Vec<String>)> {
        let mut processed = 0;
        let mut failed = 0;
        let mut errors = Vec::new();
        let batch_size = batch_size.max(1);

        for chunk in documents.chunks(batch_size) {
            match self.indexing.submit_bulk(chunk.to_vec()).await {
                Ok(_) => processed += chunk.len(),
                Err(e) => {
                    warn!(error = %e, batch_len = chunk.len(), "batch slice failed to enqueue, continuing");
                    failed += chunk.len();
                    errors.push(e.to_string());
                }
            }
        }

        Ok((processed, failed, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::StaticConnector;
    use sa_docproc::DocumentProcessor;
    use sa_domain::document::Document;
    use sa_domain::search::{SearchFilters, SearchResult, VectorIndex, VectorRecord};
    use sa_embeddings::{EmbeddingEngine, EmbeddingEngineConfig, HashInferenceBackend};
    use std::collections::HashMap as Map;

    struct NullVectorIndex;

    #[async_trait::async_trait]
    impl VectorIndex for NullVectorIndex {
        async fn upsert(&self, _records: Vec<VectorRecord>) -> Result<()> {
            Ok(())
        }
        async fn query(&self, _vector: &[f32], _top_k: usize, _filters: &SearchFilters) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _ids: &[String]) -> Result<()> {
            Ok(())
        }
        async fn count(&self) -> Result<usize> {
            Ok(0)
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn data_source(name: &str) -> DataSource {
        DataSource {
            name: name.to_string(),
            source_type: sa_domain::batch::SourceType::Crm,
            connection_params: Map::new(),
            sync_frequency: sa_domain::batch::SyncFrequency::Daily,
            incremental_field: "updated_at".into(),
            batch_size: 2,
            enabled: true,
            last_sync: None,
        }
    }

    fn doc(id: &str) -> Document {
        Document { id: id.into(), content: "{}".into(), source: "crm_contacts".into(), metadata: Map::new(), created_at: Utc::now() }
    }

    fn processor_with(records: Vec<(Document, DateTime<Utc>)>) -> Arc<BatchProcessor> {
        let indexing_store = Arc::new(sa_indexing::InMemoryIndexingStore::new());
        let doc_processor = Arc::new(DocumentProcessor::new(Default::default()));
        let embeddings = Arc::new(EmbeddingEngine::new(
            EmbeddingEngineConfig { dimension: 8, ..EmbeddingEngineConfig::default() },
            Arc::new(HashInferenceBackend::new(8)),
        ));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(NullVectorIndex);
        let indexing = Arc::new(IndexingManager::new(Default::default(), indexing_store, doc_processor, embeddings, vector_index));
        let connector = Arc::new(StaticConnector::new(records));
        Arc::new(BatchProcessor::new(BatchProcessorConfig::default(), connector, indexing))
    }

    #[tokio::test]
    async fn immediate_full_sync_enqueues_all_records_in_batch_slices() {
        let records = vec![(doc("a"), Utc::now()), (doc("b"), Utc::now()), (doc("c"), Utc::now())];
        let processor = processor_with(records);
        processor.register_data_source(data_source("acme_crm"));

        let job_id = processor.trigger_immediate_sync("acme_crm", BatchJobType::FullSync).await.unwrap();
        let jobs = processor.list_jobs();
        let job = jobs.iter().find(|j| j.id == job_id).unwrap();
        assert_eq!(job.status, BatchJobStatus::Completed);
        assert_eq!(job.processed_records, 3);
    }

    #[tokio::test]
    async fn incremental_sync_only_fetches_records_after_last_sync() {
        let stale = Utc::now() - chrono::Duration::days(2);
        let fresh = Utc::now();
        let records = vec![(doc("old"), stale), (doc("new"), fresh)];
        let processor = processor_with(records);
        let mut source = data_source("acme_erp");
        source.last_sync = Some(Utc::now() - chrono::Duration::hours(1));
        processor.register_data_source(source);

        let job_id = processor.trigger_immediate_sync("acme_erp", BatchJobType::IncrementalSync).await.unwrap();
        let jobs = processor.list_jobs();
        let job = jobs.iter().find(|j| j.id == job_id).unwrap();
        assert_eq!(job.processed_records, 1);
    }

    #[tokio::test]
    async fn unknown_data_source_is_not_found() {
        let processor = processor_with(Vec::new());
        let result = processor.trigger_immediate_sync("missing", BatchJobType::FullSync).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
