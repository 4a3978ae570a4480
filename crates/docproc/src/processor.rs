//! DocumentProcessor (C2): Document -> ordered DocumentChunk sequence.

use sa_domain::document::{DataFormat, Document, DocumentChunk};

use crate::{chunker, clean, fields, format};

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 200, chunk_overlap: 40 }
    }
}

pub struct DocumentProcessor {
    config: ChunkingConfig,
}

pub struct ProcessedDocument {
    pub data_format: DataFormat,
    pub chunks: Vec<DocumentChunk>,
}

impl DocumentProcessor {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, document: &Document) -> ProcessedDocument {
        let data_format = format::detect(document);
        let rendered = self.render(document, data_format);
        let cleaned = clean::clean(&rendered);
        let chunks = chunker::chunk(&document.id, &cleaned, self.config.chunk_size, self.config.chunk_overlap);
        ProcessedDocument { data_format, chunks }
    }

    fn render(&self, document: &Document, data_format: DataFormat) -> String {
        match data_format {
            DataFormat::PlainText | DataFormat::Json => document.content.clone(),
            structured => {
                let table = match fields::table_for(structured) {
                    Some(t) => t,
                    None => return document.content.clone(),
                };
                match serde_json::from_str::<serde_json::Value>(&document.content) {
                    Ok(serde_json::Value::Object(obj)) => {
                        let rendered = fields::render(table, &obj);
                        if rendered.is_empty() {
                            document.content.clone()
                        } else {
                            rendered
                        }
                    }
                    _ => document.content.clone(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn doc(content: &str, source: &str) -> Document {
        Document {
            id: "doc-1".into(),
            content: content.into(),
            source: source.into(),
            metadata: HashMap::new(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn crm_contact_renders_label_value_sentences_before_chunking() {
        let d = doc(r#"{"contact_name": "Jane Smith", "email": "jane@acme.com"}"#, "crm_contacts");
        let processor = DocumentProcessor::new(ChunkingConfig { chunk_size: 50, chunk_overlap: 0 });
        let result = processor.process(&d);
        assert_eq!(result.data_format, DataFormat::CrmContact);
        assert_eq!(result.chunks.len(), 1);
        assert!(result.chunks[0].content.contains("Name: Jane Smith."));
        assert!(result.chunks[0].content.contains("Email: jane@acme.com."));
    }

    #[test]
    fn plain_text_passes_through_to_chunker() {
        let d = doc("just some prose about a customer visit", "notes");
        let processor = DocumentProcessor::new(ChunkingConfig { chunk_size: 3, chunk_overlap: 1 });
        let result = processor.process(&d);
        assert_eq!(result.data_format, DataFormat::PlainText);
        assert!(result.chunks.len() > 1);
    }

    #[test]
    fn chunk_vector_ids_are_unique_within_document() {
        let d = doc("alpha beta gamma delta epsilon zeta eta theta", "notes");
        let processor = DocumentProcessor::new(ChunkingConfig { chunk_size: 3, chunk_overlap: 1 });
        let result = processor.process(&d);
        let ids: Vec<String> = result.chunks.iter().map(|c| c.vector_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
