//! HTTP surface: one router assembling every handler module onto the
//! endpoint list.

pub mod agent;
pub mod conversations;
pub mod documents;
pub mod embeddings;
pub mod meta;
pub mod nlu;
pub mod rag;
pub mod search;
pub mod tools;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/nlu", post(nlu::nlu))
        .route("/agent", post(agent::agent))
        .route("/agent/stream", post(agent::agent_stream))
        .route("/conversations/{id}", get(conversations::get_conversation).delete(conversations::delete_conversation))
        .route("/conversations/{id}/messages", post(conversations::add_message))
        .route("/tools", get(tools::list_tools))
        .route("/tools/execute", post(tools::execute_tool))
        .route("/intents", get(meta::intents))
        .route("/entities", get(meta::entities))
        .route("/stats", get(meta::stats))
        .route("/health", get(meta::health))
        .route("/documents", post(documents::ingest_multipart).get(documents::list_documents))
        .route("/documents/text", post(documents::ingest_text))
        .route("/documents/{id}", delete(documents::delete_document))
        .route("/search", post(search::search))
        .route("/rag", post(rag::rag))
        .route("/embeddings", post(embeddings::embeddings))
        .with_state(state)
}
