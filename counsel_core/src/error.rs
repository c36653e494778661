//! Tagged error taxonomy.
//!
//! The orchestrator propagates errors by kind instead of a single catch-all
//! so the transport boundary can pick a status code per kind.

use thiserror::Error;

/// Failure reading from or writing to the message store or history provider.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub anyhow::Error);

impl StorageError {
    #[must_use]
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self(cause.into())
    }
}

/// Provider, network, timeout or malformed-response failure from the model
/// gateway. Not retried at this layer.
#[derive(Debug, Error)]
#[error("generation error: {0}")]
pub struct GenerationError(pub anyhow::Error);

impl GenerationError {
    #[must_use]
    pub fn new(cause: impl Into<anyhow::Error>) -> Self {
        Self(cause.into())
    }
}

/// Everything a `handle` call can fail with.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid request: {0}")]
    Validation(String),
}
