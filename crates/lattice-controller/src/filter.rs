//! Filter trait

use async_trait::async_trait;

use crate::reconciler::WorkId;

/// Idempotency and ownership gate, evaluated at the partition's
/// serialization point immediately before each reconcile step.
///
/// A filter answers `false` when no work can be due for the ID: the node
/// does not own the partition (no leadership, no mastership), or the
/// object's status is terminal and no new incarnation is pending. Dropping
/// such items here keeps watch replays and duplicate events from spending
/// reconcile steps on settled rows.
///
/// Filters run on the worker that would execute the step, so they may read
/// the store, but they must stay cheap: every dequeued ID passes through
/// them. Ownership checks in particular must answer from locally cached
/// election state.
#[async_trait]
pub trait Filter: Send + Sync + 'static {
    type Id: WorkId;

    /// `false` drops the dequeued item without running a step.
    async fn accept(&self, id: &Self::Id) -> bool;
}
