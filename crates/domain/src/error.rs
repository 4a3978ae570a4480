/// Shared error type used across all crates in the workspace.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timeout: {0}")]
    Timeout(String),

    /// Malformed or missing request input. Maps to HTTP 400.
    #[error("validation: {0}")]
    Validation(String),

    /// Referenced entity (conversation, document, job, tool) does not exist.
    /// Maps to HTTP 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// A rate limit was hit. Never retried automatically. Maps to HTTP 503.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// An upstream collaborator (LLM, RAG, vector DB) timed out or returned
    /// a 5xx after retries were exhausted. Maps to HTTP 503.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// A durable-store operation failed transiently; callers should log and
    /// re-enqueue rather than surface the failure to the end user.
    #[error("store: {0}")]
    Store(String),

    /// Cancellation of an in-flight operation (e.g. a dropped client
    /// connection). Not a user-facing error — callers swallow this variant.
    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Maps this error to the HTTP status code it should surface as,
    /// following the taxonomy: Validation -> 400, NotFound -> 404,
    /// RateLimited/Upstream -> 503, everything else -> 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::RateLimited(_) | Error::Upstream(_) | Error::Timeout(_) => 503,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(Error::Validation("x".into()).status_code(), 400);
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::RateLimited("x".into()).status_code(), 503);
        assert_eq!(Error::Upstream("x".into()).status_code(), 503);
        assert_eq!(Error::Other("x".into()).status_code(), 500);
    }
}
