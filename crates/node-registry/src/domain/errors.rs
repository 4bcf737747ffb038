//! # Domain Errors
//!
//! Collaborator faults. Expected per-message outcomes are not errors; see
//! `outcome::Discard`.

use shared_types::PublishError;
use thiserror::Error;

/// A storage backend failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Stored record could not be decoded: {0}")]
    Corrupted(String),
}

/// Unexpected failure while dispatching a message.
///
/// The ingest loop logs it and moves on to the next message.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Repository fault: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Publish fault: {0}")]
    Publish(#[from] PublishError),

    #[error("Serialization fault: {0}")]
    Serialization(#[from] serde_json::Error),
}
