//! Durable storage contract for indexing state (spec.md §6: `rag:*` KV
//! collections). Production deployments back this with the external KV/list
//! store; `InMemoryIndexingStore` is the in-process stand-in used by tests
//! and small deployments, in the same spirit as `sa_search::InMemoryVectorIndex`.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::RwLock;

use sa_domain::error::Result;
use sa_domain::indexing::{IndexedDocument, IndexingJob};

/// A single-document work item consumed by an indexing worker.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub document: sa_domain::document::Document,
    pub job_id: String,
}

#[async_trait]
pub trait IndexingStore: Send + Sync {
    async fn put_document(&self, doc: IndexedDocument) -> Result<()>;
    async fn get_document(&self, id: &str) -> Result<Option<IndexedDocument>>;
    async fn delete_document(&self, id: &str) -> Result<()>;
    async fn list_documents(&self) -> Result<Vec<IndexedDocument>>;

    async fn put_job(&self, job: IndexingJob) -> Result<()>;
    async fn get_job(&self, id: &str) -> Result<Option<IndexingJob>>;
    async fn list_jobs(&self) -> Result<Vec<IndexingJob>>;
    async fn delete_job(&self, id: &str) -> Result<()>;

    async fn push_single(&self, entry: QueueEntry) -> Result<()>;
    async fn pop_single(&self) -> Result<Option<QueueEntry>>;
    async fn push_bulk(&self, entries: Vec<QueueEntry>) -> Result<()>;
    async fn pop_bulk_batch(&self, max: usize) -> Result<Vec<QueueEntry>>;
}

#[derive(Default)]
struct Inner {
    documents: HashMap<String, IndexedDocument>,
    jobs: HashMap<String, IndexingJob>,
    single_queue: VecDeque<QueueEntry>,
    bulk_queue: VecDeque<QueueEntry>,
}

pub struct InMemoryIndexingStore {
    inner: RwLock<Inner>,
}

impl InMemoryIndexingStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::default()) }
    }
}

impl Default for InMemoryIndexingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexingStore for InMemoryIndexingStore {
    async fn put_document(&self, doc: IndexedDocument) -> Result<()> {
        self.inner.write().documents.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<IndexedDocument>> {
        Ok(self.inner.read().documents.get(id).cloned())
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        self.inner.write().documents.remove(id);
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>> {
        Ok(self.inner.read().documents.values().cloned().collect())
    }

    async fn put_job(&self, job: IndexingJob) -> Result<()> {
        self.inner.write().jobs.insert(job.job_id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<IndexingJob>> {
        Ok(self.inner.read().jobs.get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<IndexingJob>> {
        Ok(self.inner.read().jobs.values().cloned().collect())
    }

    async fn delete_job(&self, id: &str) -> Result<()> {
        self.inner.write().jobs.remove(id);
        Ok(())
    }

    async fn push_single(&self, entry: QueueEntry) -> Result<()> {
        self.inner.write().single_queue.push_back(entry);
        Ok(())
    }

    async fn pop_single(&self) -> Result<Option<QueueEntry>> {
        Ok(self.inner.write().single_queue.pop_front())
    }

    async fn push_bulk(&self, entries: Vec<QueueEntry>) -> Result<()> {
        self.inner.write().bulk_queue.extend(entries);
        Ok(())
    }

    async fn pop_bulk_batch(&self, max: usize) -> Result<Vec<QueueEntry>> {
        let mut inner = self.inner.write();
        let n = max.min(inner.bulk_queue.len());
        Ok(inner.bulk_queue.drain(..n).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sa_domain::document::{DataFormat, Document};

    fn doc(id: &str) -> sa_domain::document::Document {
        Document { id: id.to_string(), content: "x".into(), source: "s".into(), metadata: HashMap::new(), created_at: chrono::Utc::now() }
    }

    #[tokio::test]
    async fn single_queue_is_fifo() {
        let store = InMemoryIndexingStore::new();
        store.push_single(QueueEntry { document: doc("a"), job_id: "j1".into() }).await.unwrap();
        store.push_single(QueueEntry { document: doc("b"), job_id: "j1".into() }).await.unwrap();
        let first = store.pop_single().await.unwrap().unwrap();
        assert_eq!(first.document.id, "a");
    }

    #[tokio::test]
    async fn bulk_batch_pop_respects_max() {
        let store = InMemoryIndexingStore::new();
        let entries: Vec<_> = ["a", "b", "c"].iter().map(|id| QueueEntry { document: doc(id), job_id: "j1".into() }).collect();
        store.push_bulk(entries).await.unwrap();
        let batch = store.pop_bulk_batch(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        let rest = store.pop_bulk_batch(10).await.unwrap();
        assert_eq!(rest.len(), 1);
        let _ = DataFormat::PlainText;
    }
}
