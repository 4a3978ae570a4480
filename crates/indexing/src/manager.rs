//! IndexingManager (C6): durable, concurrent document indexing with
//! per-document state tracking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sa_docproc::DocumentProcessor;
use sa_domain::document::Document;
use sa_domain::error::Result;
use sa_domain::indexing::{DocumentStatus, IndexedDocument, IndexingJob, JobType};
use sa_domain::search::{VectorIndex, VectorRecord};
use sa_domain::trace::TraceEvent;
use sa_embeddings::EmbeddingEngine;

use crate::store::{IndexingStore, QueueEntry};

#[derive(Debug, Clone)]
pub struct IndexingManagerConfig {
    pub worker_count: usize,
    pub max_retries: u32,
    pub bulk_batch_size: usize,
    pub bulk_inter_batch_pacing: Duration,
    pub job_retention: chrono::Duration,
}

impl Default for IndexingManagerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_retries: 3,
            bulk_batch_size: 50,
            bulk_inter_batch_pacing: Duration::from_millis(100),
            job_retention: chrono::Duration::hours(24),
        }
    }
}

pub struct IndexingManager {
    config: IndexingManagerConfig,
    store: Arc<dyn IndexingStore>,
    processor: Arc<DocumentProcessor>,
    embeddings: Arc<EmbeddingEngine>,
    vector_index: Arc<dyn VectorIndex>,
}

impl IndexingManager {
    pub fn new(
        config: IndexingManagerConfig,
        store: Arc<dyn IndexingStore>,
        processor: Arc<DocumentProcessor>,
        embeddings: Arc<EmbeddingEngine>,
        vector_index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self { config, store, processor, embeddings, vector_index }
    }

    /// Enqueue a single document for indexing; returns the job id.
    pub async fn submit_single(&self, document: Document) -> Result<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let job = IndexingJob::new(job_id.clone(), JobType::Single, vec![document.id.clone()]);
        self.store.put_job(job).await?;
        self.store
            .put_document(IndexedDocument::new(document.id.clone(), document.source.clone(), sa_docproc::format::detect(&document)))
            .await?;
        self.store.push_single(QueueEntry { document, job_id: job_id.clone() }).await?;
        Ok(job_id)
    }

    /// Enqueue many documents as a bulk job; the bulk worker fans these
    /// into the single queue in `bulk_batch_size` slices.
    pub async fn submit_bulk(&self, documents: Vec<Document>) -> Result<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let job = IndexingJob::new(job_id.clone(), JobType::Bulk, ids);
        self.store.put_job(job).await?;

        let entries: Vec<QueueEntry> = documents
            .into_iter()
            .map(|document| QueueEntry { document, job_id: job_id.clone() })
            .collect();
        for entry in &entries {
            self.store
                .put_document(IndexedDocument::new(
                    entry.document.id.clone(),
                    entry.document.source.clone(),
                    sa_docproc::format::detect(&entry.document),
                ))
                .await?;
        }
        self.store.push_bulk(entries).await?;
        Ok(job_id)
    }

    /// Delete a document's chunks from the vector index and remove its
    /// registry entry.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let Some(doc) = self.store.get_document(id).await? else { return Ok(()) };
        let chunk_ids: Vec<String> = (0..doc.chunk_count).map(|i| format!("{}_{}", id, i)).collect();
        if !chunk_ids.is_empty() {
            self.vector_index.delete(&chunk_ids).await?;
        }
        self.store.delete_document(id).await?;
        Ok(())
    }

    /// Look up one document's registry entry by id, for the gateway's
    /// `GET /documents/{id}` handler.
    pub async fn get_document(&self, id: &str) -> Result<Option<IndexedDocument>> {
        self.store.get_document(id).await
    }

    /// List every document's registry entry, for the gateway's
    /// `GET /documents` handler.
    pub async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        self.store.list_documents().await
    }

    /// Spawn `worker_count` single-document workers, one bulk fan-out
    /// worker, and a janitor task. Returns their join handles; callers
    /// `await` them after cancelling `token` for a graceful shutdown.
    pub fn spawn_workers(self: &Arc<Self>, token: CancellationToken) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();
        for worker_id in 0..self.config.worker_count {
            let manager = Arc::clone(self);
            let token = token.clone();
            handles.push(tokio::spawn(async move { manager.run_worker(worker_id, token).await }));
        }
        {
            let manager = Arc::clone(self);
            let token = token.clone();
            handles.push(tokio::spawn(async move { manager.run_bulk_worker(token).await }));
        }
        {
            let manager = Arc::clone(self);
            handles.push(tokio::spawn(async move { manager.run_janitor(token).await }));
        }
        handles
    }

    async fn run_worker(&self, worker_id: usize, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                info!(worker_id, "indexing worker shutting down");
                return;
            }
            match self.store.pop_single().await {
                Ok(Some(entry)) => self.process_entry(entry).await,
                Ok(None) => sleep(Duration::from_millis(50)).await,
                Err(e) => {
                    warn!(worker_id, error = %e, "queue poll failed, backing off");
                    sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    async fn run_bulk_worker(&self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                return;
            }
            match self.store.pop_bulk_batch(self.config.bulk_batch_size).await {
                Ok(batch) if !batch.is_empty() => {
                    for entry in batch {
                        if let Err(e) = self.store.push_single(entry).await {
                            error!(error = %e, "failed to fan bulk entry into single queue");
                        }
                    }
                    sleep(self.config.bulk_inter_batch_pacing).await;
                }
                Ok(_) => sleep(Duration::from_millis(200)).await,
                Err(e) => {
                    warn!(error = %e, "bulk queue poll failed");
                    sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    async fn run_janitor(&self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                return;
            }
            sleep(Duration::from_secs(300)).await;
            if let Ok(jobs) = self.store.list_jobs().await {
                let cutoff = Utc::now() - self.config.job_retention;
                for job in jobs {
                    let terminal = matches!(job.status, sa_domain::indexing::JobStatus::Completed | sa_domain::indexing::JobStatus::Failed);
                    if terminal && job.created_at < cutoff {
                        let _ = self.store.delete_job(&job.job_id).await;
                    }
                }
            }
        }
    }

    async fn process_entry(&self, entry: QueueEntry) {
        let QueueEntry { document, job_id } = entry;
        let doc_id = document.id.clone();
        let started = std::time::Instant::now();

        if let Some(mut doc) = self.store.get_document(&doc_id).await.ok().flatten() {
            doc.status = DocumentStatus::Processing;
            doc.updated_at = Utc::now();
            let _ = self.store.put_document(doc).await;
        }

        match self.index_document(&document).await {
            Ok(chunk_count) => {
                let mut data_format = sa_domain::document::DataFormat::PlainText;
                if let Some(mut doc) = self.store.get_document(&doc_id).await.ok().flatten() {
                    doc.status = DocumentStatus::Completed;
                    doc.chunk_count = chunk_count;
                    doc.version += 1;
                    doc.updated_at = Utc::now();
                    data_format = doc.data_format;
                    let _ = self.store.put_document(doc).await;
                }
                TraceEvent::DocumentIndexed {
                    document_id: doc_id.clone(),
                    chunk_count,
                    data_format: data_format.as_str().to_string(),
                    processing_time_ms: started.elapsed().as_millis() as u64,
                }
                .emit();
                self.finish_job_outcome(&job_id, true, None).await;
            }
            Err(e) => {
                self.handle_failure(&doc_id, &job_id, e).await;
            }
        }
    }

    async fn index_document(&self, document: &Document) -> Result<usize> {
        let processed = self.processor.process(document);
        if processed.chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = processed.chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.encode_documents(&texts).await?;

        let records: Vec<VectorRecord> = processed
            .chunks
            .iter()
            .zip(vectors.into_iter())
            .map(|(chunk, vector)| VectorRecord {
                id: chunk.vector_id(),
                vector,
                content: chunk.content.clone(),
                source: document.source.clone(),
                metadata: document.metadata.clone(),
            })
            .collect();

        let chunk_count = records.len();
        self.vector_index.upsert(records).await?;
        Ok(chunk_count)
    }

    async fn handle_failure(&self, doc_id: &str, job_id: &str, error: sa_domain::error::Error) {
        let message = error.to_string();

        let mut retry = false;
        let mut retry_count = 0;
        if let Some(mut doc) = self.store.get_document(doc_id).await.ok().flatten() {
            doc.retry_count += 1;
            retry_count = doc.retry_count;
            doc.updated_at = Utc::now();
            if doc.retry_count < self.config.max_retries {
                doc.status = DocumentStatus::Retry;
                retry = true;
            } else {
                doc.status = DocumentStatus::Failed;
                doc.error_message = Some(message.clone());
            }
            let _ = self.store.put_document(doc).await;
        }

        TraceEvent::DocumentIndexFailed { document_id: doc_id.to_string(), retry_count, error: message.clone() }.emit();

        if retry {
            if let Some(doc) = self.store.get_document(doc_id).await.ok().flatten() {
                let _ = self.store.push_single(QueueEntry { document: Document { id: doc.id, content: String::new(), source: doc.source, metadata: Default::default(), created_at: doc.created_at }, job_id: job_id.to_string() }).await;
            }
            return;
        }

        self.finish_job_outcome(job_id, false, Some(message)).await;
    }

    async fn finish_job_outcome(&self, job_id: &str, success: bool, error: Option<String>) {
        if let Some(mut job) = self.store.get_job(job_id).await.ok().flatten() {
            job.record_outcome(success, error);
            let _ = self.store.put_job(job).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::RwLock as PLRwLock;
    use sa_domain::search::SearchResult;
    use sa_embeddings::{EmbeddingEngineConfig, HashInferenceBackend};
    use std::collections::HashMap;

    struct FakeVectorIndex {
        upserted: PLRwLock<Vec<String>>,
    }

    #[async_trait]
    impl VectorIndex for FakeVectorIndex {
        async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
            self.upserted.write().extend(records.into_iter().map(|r| r.id));
            Ok(())
        }
        async fn query(&self, _vector: &[f32], _top_k: usize, _filters: &sa_domain::search::SearchFilters) -> Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }
        async fn delete(&self, ids: &[String]) -> Result<()> {
            self.upserted.write().retain(|id| !ids.contains(id));
            Ok(())
        }
        async fn count(&self) -> Result<usize> {
            Ok(self.upserted.read().len())
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    fn manager() -> Arc<IndexingManager> {
        let store: Arc<dyn IndexingStore> = Arc::new(crate::store::InMemoryIndexingStore::new());
        let processor = Arc::new(DocumentProcessor::new(Default::default()));
        let embeddings = Arc::new(EmbeddingEngine::new(
            EmbeddingEngineConfig { dimension: 16, ..EmbeddingEngineConfig::default() },
            Arc::new(HashInferenceBackend::new(16)),
        ));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(FakeVectorIndex { upserted: PLRwLock::new(Vec::new()) });
        Arc::new(IndexingManager::new(IndexingManagerConfig::default(), store, processor, embeddings, vector_index))
    }

    fn doc(id: &str, content: &str) -> Document {
        Document { id: id.into(), content: content.into(), source: "notes".into(), metadata: HashMap::new(), created_at: Utc::now() }
    }

    #[tokio::test]
    async fn single_submission_is_processed_to_completion() {
        let manager = manager();
        let job_id = manager.submit_single(doc("d1", "alpha beta gamma delta")).await.unwrap();

        let entry = manager.store.pop_single().await.unwrap().unwrap();
        manager.process_entry(entry).await;

        let updated = manager.store.get_document("d1").await.unwrap().unwrap();
        assert_eq!(updated.status, DocumentStatus::Completed);
        assert!(updated.chunk_count >= 1);

        let job = manager.store.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(job.success_count, 1);
    }

    #[tokio::test]
    async fn delete_document_removes_its_chunks_from_the_index() {
        let manager = manager();
        manager.submit_single(doc("d2", "red sneakers restocked")).await.unwrap();
        let entry = manager.store.pop_single().await.unwrap().unwrap();
        manager.process_entry(entry).await;

        manager.delete_document("d2").await.unwrap();
        assert_eq!(manager.vector_index.count().await.unwrap(), 0);
        assert!(manager.store.get_document("d2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bulk_submission_fans_into_single_queue() {
        let manager = manager();
        manager.submit_bulk(vec![doc("b1", "one"), doc("b2", "two")]).await.unwrap();
        assert!(manager.store.pop_bulk_batch(10).await.unwrap().len() == 2);
    }
}
