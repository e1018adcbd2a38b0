//! Reconciler trait and step outcome

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

use crate::error::ControllerError;

/// Requirements on the IDs a controller schedules.
pub trait WorkId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> WorkId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// What a reconcile step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The step is finished; drop the item. Further work, if any, arrives as
    /// a new store event.
    Done,
    /// The step could not make progress (revision conflict, transient store
    /// failure); re-run it after a backoff.
    Retry,
}

/// One reconciliation step: read the latest object for the ID, compute, and
/// write at most one batch of updates.
///
/// Steps for the same partition never overlap; the same ID may be handed to
/// the reconciler many times, so steps must be idempotent. Errors are treated
/// like [`Outcome::Retry`].
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    type Id: WorkId;

    async fn reconcile(&self, id: Self::Id) -> Result<Outcome, ControllerError>;
}
