//! Batch-sync data model for the scheduled CRM/ERP ingestion pipeline (C7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Crm,
    Erp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFrequency {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub source_type: SourceType,
    pub connection_params: HashMap<String, String>,
    pub sync_frequency: SyncFrequency,
    pub incremental_field: String,
    pub batch_size: usize,
    pub enabled: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobType {
    FullSync,
    IncrementalSync,
    Cleanup,
    Reindex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: String,
    pub job_type: BatchJobType,
    pub source_system: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: BatchJobStatus,
    pub progress: u8,
    pub total_records: usize,
    pub processed_records: usize,
    pub failed_records: usize,
    #[serde(default)]
    pub error_messages: Vec<String>,
}

impl BatchJob {
    pub fn new(id: impl Into<String>, job_type: BatchJobType, source_system: impl Into<String>, scheduled_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            job_type,
            source_system: source_system.into(),
            scheduled_time,
            status: BatchJobStatus::Scheduled,
            progress: 0,
            total_records: 0,
            processed_records: 0,
            failed_records: 0,
            error_messages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub jobs_run: u64,
    pub jobs_failed: u64,
    pub records_processed: u64,
    pub records_failed: u64,
}
