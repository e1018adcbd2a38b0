//! Store error types

use thiserror::Error;

/// Errors surfaced by the change stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The caller's revision is stale. The display string is part of the
    /// public contract; callers re-read and retry.
    #[error("write condition failed")]
    WriteConditionFailed,

    /// Create of an object whose ID is already present
    #[error("object already exists: {0}")]
    AlreadyExists(String),

    /// Update of an object that was never created
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store has been closed
    #[error("store closed")]
    Closed,

    /// Backend failure; transient from the caller's point of view
    #[error("store error: {0}")]
    Internal(String),
}
