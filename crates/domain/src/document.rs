//! Document and chunk types shared by the document processor, indexing
//! manager, and batch processor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw record to be indexed: a CRM/ERP record, a relational row, or plain
/// text. `(source, id)` together form the natural key used by batch sync to
/// detect whether a record has already been seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub source: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Structured or textual format a [`Document`] was recognized as, used to
/// pick the field-mapping table applied during chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    CrmContact,
    CrmOpportunity,
    ErpProduct,
    ErpOrder,
    ErpInvoice,
    GenericRecord,
    Json,
    PlainText,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::CrmContact => "crm_contact",
            DataFormat::CrmOpportunity => "crm_opportunity",
            DataFormat::ErpProduct => "erp_product",
            DataFormat::ErpOrder => "erp_order",
            DataFormat::ErpInvoice => "erp_invoice",
            DataFormat::GenericRecord => "generic_record",
            DataFormat::Json => "json",
            DataFormat::PlainText => "plain_text",
        }
    }
}

/// One fixed-size, overlapping window of a document's cleaned text, produced
/// by the document processor and consumed by the embedding engine / indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub document_id: String,
    pub chunk_index: usize,
    pub content: String,
    pub word_count: usize,
    pub start_word_index: usize,
    pub end_word_index: usize,
}

impl DocumentChunk {
    /// The id under which this chunk's embedding is upserted into the
    /// vector index: `"{document_id}_{chunk_index}"`.
    pub fn vector_id(&self) -> String {
        format!("{}_{}", self.document_id, self.chunk_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_id_format() {
        let chunk = DocumentChunk {
            document_id: "doc-1".into(),
            chunk_index: 3,
            content: String::new(),
            word_count: 0,
            start_word_index: 0,
            end_word_index: 0,
        };
        assert_eq!(chunk.vector_id(), "doc-1_3");
    }
}
