use serde::Serialize;

/// Structured trace events emitted across all SerialAgent crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmFallback {
        from_provider: String,
        from_model: String,
        to_provider: String,
        to_model: String,
        reason: String,
    },
    IntentClassified {
        conversation_id: String,
        intent: String,
        confidence: f32,
    },
    EntitiesExtracted {
        conversation_id: String,
        count: usize,
    },
    RoutingDecided {
        conversation_id: String,
        decision: String,
    },
    ToolExecuted {
        execution_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        retries: u32,
    },
    ToolRateLimited {
        tool_name: String,
        calls_in_window: u32,
    },
    HybridSearchCompleted {
        query_chars: usize,
        dense_count: usize,
        sparse_count: usize,
        fused_count: usize,
    },
    DocumentIndexed {
        document_id: String,
        chunk_count: usize,
        data_format: String,
        processing_time_ms: u64,
    },
    DocumentIndexFailed {
        document_id: String,
        retry_count: u32,
        error: String,
    },
    BatchJobCompleted {
        job_id: String,
        job_type: String,
        source: String,
        processed: usize,
        failed: usize,
    },
    ConversationEvicted {
        conversation_id: String,
        idle_secs: i64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sa_event");
    }
}
