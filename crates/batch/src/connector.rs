//! External CRM/ERP data source contract (spec.md §1 Non-goals: "CRM/ERP
//! system internals"). The batch processor only needs a way to list and
//! fetch records; connecting to an actual CRM/ERP is out of scope, mirroring
//! how `VectorIndex`/`LlmClient` are collaborator contracts in the other
//! components.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sa_domain::batch::DataSource;
use sa_domain::document::Document;
use sa_domain::error::Result;

#[async_trait]
pub trait DataSourceConnector: Send + Sync {
    /// Fetch every record from `source`, converted to `Document`s with
    /// JSON-serialized content and metadata carrying `source`/`table`/
    /// `record_id`.
    async fn fetch_all(&self, source: &DataSource) -> Result<Vec<Document>>;

    /// Fetch only records with `updated_at > since`.
    async fn fetch_incremental(&self, source: &DataSource, since: DateTime<Utc>) -> Result<Vec<Document>>;
}

/// A connector backed by an in-memory record set, useful for tests and demo
/// deployments that don't have a real CRM/ERP to talk to.
pub struct StaticConnector {
    records: Vec<(Document, DateTime<Utc>)>,
}

impl StaticConnector {
    pub fn new(records: Vec<(Document, DateTime<Utc>)>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DataSourceConnector for StaticConnector {
    async fn fetch_all(&self, _source: &DataSource) -> Result<Vec<Document>> {
        Ok(self.records.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn fetch_incremental(&self, _source: &DataSource, since: DateTime<Utc>) -> Result<Vec<Document>> {
        Ok(self.records.iter().filter(|(_, updated_at)| *updated_at > since).map(|(d, _)| d.clone()).collect())
    }
}
