//! Gateway: wires every orchestration-core crate into an axum HTTP server.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod error;
pub mod llm_client;
pub mod state;
pub mod tool_registry;
