//! `POST /documents`, `POST /documents/text`, `GET /documents`,
//! `DELETE /documents/{id}` — document ingestion and registry lookup.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sa_domain::document::Document;
use sa_domain::error::Error;
use sa_domain::indexing::{DocumentStatus, IndexedDocument};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub document_id: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct TextIngestRequest {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

pub async fn ingest_text(State(state): State<AppState>, Json(req): Json<TextIngestRequest>) -> ApiResult<Json<IngestResponse>> {
    if req.content.trim().is_empty() {
        return Err(ApiError(Error::Validation("content must not be empty".into())));
    }
    let document = Document {
        id: uuid::Uuid::new_v4().to_string(),
        content: req.content,
        source: req.source.unwrap_or_else(|| "api".to_string()),
        metadata: req.metadata,
        created_at: Utc::now(),
    };
    let document_id = document.id.clone();
    state.indexing.submit_single(document).await?;
    Ok(Json(IngestResponse { document_id, status: "queued_for_indexing" }))
}

/// Multipart upload: each part's field name becomes the document `source`
/// (falling back to `"upload"`), its bytes become the content.
pub async fn ingest_multipart(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<IngestResponse>> {
    let mut document_id = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError(Error::Validation(format!("malformed multipart body: {e}"))))? {
        let source = field.file_name().map(|s| s.to_string()).unwrap_or_else(|| "upload".to_string());
        let bytes = field.bytes().await.map_err(|e| ApiError(Error::Validation(format!("reading multipart field: {e}"))))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        if content.trim().is_empty() {
            continue;
        }
        let document = Document { id: uuid::Uuid::new_v4().to_string(), content, source, metadata: HashMap::new(), created_at: Utc::now() };
        document_id = Some(document.id.clone());
        state.indexing.submit_single(document).await?;
    }
    let document_id = document_id.ok_or_else(|| ApiError(Error::Validation("multipart body contained no usable parts".into())))?;
    Ok(Json(IngestResponse { document_id, status: "queued_for_indexing" }))
}

pub async fn delete_document(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    state.indexing.delete_document(&id).await?;
    Ok(Json(serde_json::json!({ "document_id": id, "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub status: Option<String>,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<IndexedDocument>,
    pub total: usize,
}

pub async fn list_documents(State(state): State<AppState>, Query(query): Query<ListDocumentsQuery>) -> ApiResult<Json<ListDocumentsResponse>> {
    let mut documents = state.indexing.list_documents().await?;
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if let Some(status) = &query.status {
        let wanted = parse_status(status)?;
        documents.retain(|d| d.status == wanted);
    }

    let total = documents.len();
    let page = documents.into_iter().skip(query.offset).take(query.limit).collect();
    Ok(Json(ListDocumentsResponse { documents: page, total }))
}

fn parse_status(s: &str) -> ApiResult<DocumentStatus> {
    match s {
        "pending" => Ok(DocumentStatus::Pending),
        "processing" => Ok(DocumentStatus::Processing),
        "completed" => Ok(DocumentStatus::Completed),
        "failed" => Ok(DocumentStatus::Failed),
        "retry" => Ok(DocumentStatus::Retry),
        "deleted" => Ok(DocumentStatus::Deleted),
        other => Err(ApiError(Error::Validation(format!("unknown document status '{other}'")))),
    }
}
