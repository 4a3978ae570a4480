//! Remote business-API tool dispatch (C11): registry, schema validation,
//! rate limiting, caching, and retry.

pub mod dispatcher;

pub use dispatcher::ToolDispatcher;
