//! Watcher trait

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::ControllerError;
use crate::reconciler::WorkId;

/// Turns a store's change stream into candidate work item IDs.
///
/// `start` registers the watch and spawns a forwarding task that pushes one
/// ID per store event into `queue` until the token is cancelled, then
/// returns. The event kind and object payload are deliberately dropped: the
/// reconciler always re-reads the latest state, which is what makes replayed
/// and duplicated events harmless.
#[async_trait]
pub trait Watcher: Send + Sync + 'static {
    type Id: WorkId;

    async fn start(
        &self,
        queue: mpsc::Sender<Self::Id>,
        token: CancellationToken,
    ) -> Result<(), ControllerError>;
}
