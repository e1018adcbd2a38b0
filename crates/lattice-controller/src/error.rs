//! Controller error types

use thiserror::Error;

/// Errors surfaced by the controller framework and its reconcilers.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// `start` called on a running controller
    #[error("controller already started")]
    AlreadyStarted,

    /// A controller was assembled without a required part
    #[error("controller misconfigured: {0}")]
    Misconfigured(String),

    /// Registering a store watch failed
    #[error("watch failed: {0}")]
    Watch(String),

    /// A store call inside a reconcile step failed; the step is retried
    #[error("store error: {0}")]
    Store(String),

    /// Anything else a reconcile step wants retried
    #[error("reconcile error: {0}")]
    Reconcile(String),
}
