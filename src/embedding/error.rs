use thiserror::Error;

/// Errors surfaced by embedding providers.
///
/// Variants carry owned strings rather than source errors so a single
/// flight's outcome can be cloned to every concurrent waiter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("embedding request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("embedding call exceeded {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error("provider returned a {actual}-dim vector, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

pub type ProviderResult<T> = Result<T, ProviderError>;
