//! Indexing data model shared between the indexing manager, the batch
//! processor, and the gateway's RAG API surface (C6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DataFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Retry,
    Deleted,
}

/// Per-document indexing state.
///
/// State machine: `Pending -> Processing -> Completed`;
/// `Processing -> Failed -> Retry -> Processing` while
/// `retry_count < max_retries`; any state `-> Deleted` (terminal).
/// `chunk_count` is only set on transition to `Completed`; `version`
/// increments on every re-index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub source: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub chunk_count: usize,
    pub data_format: DataFormat,
    pub retry_count: u32,
    pub version: u32,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl IndexedDocument {
    pub fn new(id: impl Into<String>, source: impl Into<String>, data_format: DataFormat) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source: source.into(),
            status: DocumentStatus::Pending,
            created_at: now,
            updated_at: now,
            chunk_count: 0,
            data_format,
            retry_count: 0,
            version: 0,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Single,
    Bulk,
    Reindex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingJob {
    pub job_id: String,
    pub document_ids: Vec<String>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: u8,
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub error_summary: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl IndexingJob {
    pub fn new(job_id: impl Into<String>, job_type: JobType, document_ids: Vec<String>) -> Self {
        let total = document_ids.len();
        Self {
            job_id: job_id.into(),
            document_ids,
            job_type,
            status: JobStatus::Pending,
            progress: 0,
            total,
            success_count: 0,
            failure_count: 0,
            error_summary: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Records one document outcome; recomputes `progress` and, once every
    /// document has reported, transitions the job to its terminal status.
    pub fn record_outcome(&mut self, success: bool, error: Option<String>) {
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
            if let Some(msg) = error {
                self.error_summary.push(msg);
            }
        }
        self.status = JobStatus::Running;
        let done = self.success_count + self.failure_count;
        self.progress = if self.total == 0 { 100 } else { ((done * 100) / self.total) as u8 };
        if done >= self.total {
            self.status = if self.failure_count > 0 { JobStatus::Failed } else { JobStatus::Completed };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_transitions_to_completed_once_all_documents_report() {
        let mut job = IndexingJob::new("j1", JobType::Bulk, vec!["d1".into(), "d2".into()]);
        job.record_outcome(true, None);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.progress, 50);
        job.record_outcome(true, None);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn any_failure_marks_job_failed() {
        let mut job = IndexingJob::new("j1", JobType::Bulk, vec!["d1".into(), "d2".into()]);
        job.record_outcome(true, None);
        job.record_outcome(false, Some("boom".into()));
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_summary, vec!["boom".to_string()]);
    }
}
