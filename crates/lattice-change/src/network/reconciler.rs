//! Network-change reconciliation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use lattice_controller::{ControllerError, Outcome, Reconciler};
use lattice_core::{
    DeviceChange, DeviceChangeRef, NetworkChange, NetworkChangeId, Phase, Reason, State, Status,
};
use lattice_store::{DeviceChangeStore, LeadershipStore, NetworkChangeStore, StoreError};
use lattice_topology::DeviceCache;

/// Status message recorded on a network change when a device rejects the
/// change itself.
const CHANGE_REJECTED: &str = "change rejected by device";

/// Status message recorded on a network change when a device rejects the
/// rollback.
const ROLLBACK_REJECTED: &str = "rollback rejected by device";

/// Drives one network change per step.
///
/// Each step reads the latest parent and children and performs exactly one of:
/// create missing children, issue the first incarnation, propagate a new
/// incarnation down, or fold the children's states back up into the parent.
/// All writes are revision-conditional; any conflict aborts the step and the
/// change is requeued.
pub(crate) struct NetworkChangeReconciler {
    leadership: Arc<dyn LeadershipStore>,
    device_cache: Arc<dyn DeviceCache>,
    network_changes: Arc<dyn NetworkChangeStore>,
    device_changes: Arc<dyn DeviceChangeStore>,
}

fn store_error(err: StoreError) -> ControllerError {
    ControllerError::Store(err.to_string())
}

impl NetworkChangeReconciler {
    pub(crate) fn new(
        leadership: Arc<dyn LeadershipStore>,
        device_cache: Arc<dyn DeviceCache>,
        network_changes: Arc<dyn NetworkChangeStore>,
        device_changes: Arc<dyn DeviceChangeStore>,
    ) -> Self {
        NetworkChangeReconciler {
            leadership,
            device_cache,
            network_changes,
            device_changes,
        }
    }

    /// Creates the missing child rows and records their refs on the parent.
    async fn create_children(&self, mut change: NetworkChange) -> Result<Outcome, ControllerError> {
        let mut refs = Vec::with_capacity(change.changes.len());
        for spec in &change.changes {
            let mut child = DeviceChange::for_network_change(
                &change.id,
                spec.clone(),
                Status {
                    phase: change.status.phase,
                    state: State::Pending,
                    reason: Reason::None,
                    message: String::new(),
                    incarnation: change.status.incarnation,
                },
            );
            let id = child.id.clone();
            match self.device_changes.create(&mut child).await {
                Ok(()) => {
                    debug!(change = %change.id, child = %id, "created device change");
                }
                Err(StoreError::AlreadyExists(_)) => {}
                Err(err) => return Err(store_error(err)),
            }
            refs.push(DeviceChangeRef {
                device_change_id: id,
            });
        }

        change.refs = refs;
        match self.network_changes.update(&mut change).await {
            Ok(()) => Ok(Outcome::Done),
            Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
            Err(err) => Err(store_error(err)),
        }
    }

    /// First issue: incarnation 0 means created but never handed to the
    /// devices. Bumping to 1 is what makes the children actionable.
    async fn issue(&self, mut change: NetworkChange) -> Result<Outcome, ControllerError> {
        change.status.incarnation += 1;
        info!(change = %change.id, incarnation = change.status.incarnation, "issuing network change");
        match self.network_changes.update(&mut change).await {
            Ok(()) => Ok(Outcome::Done),
            Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
            Err(err) => Err(store_error(err)),
        }
    }

    /// The state a child should enter when it is (re)targeted at the given
    /// phase: pending work, except that rolling back a device that is not in
    /// the cache completes immediately since nothing was ever applied there.
    async fn target_state(&self, phase: Phase, child: &DeviceChange) -> State {
        match phase {
            Phase::Change => State::Pending,
            Phase::Rollback => {
                if self
                    .device_cache
                    .contains(&child.change.device_id, &child.change.device_version)
                    .await
                {
                    State::Pending
                } else {
                    State::Complete
                }
            }
        }
    }

    /// Brings lagging children up to the parent's phase and incarnation.
    async fn propagate(
        &self,
        change: &NetworkChange,
        children: Vec<DeviceChange>,
    ) -> Result<Outcome, ControllerError> {
        for mut child in children {
            if child.status.incarnation >= change.status.incarnation {
                continue;
            }
            child.status.phase = change.status.phase;
            child.status.incarnation = change.status.incarnation;
            child.status.state = self.target_state(change.status.phase, &child).await;
            child.status.reason = Reason::None;
            child.status.message = String::new();
            debug!(change = %change.id, child = %child.id, status = ?child.status, "propagating incarnation");
            match self.device_changes.update(&mut child).await {
                Ok(()) => {}
                Err(StoreError::WriteConditionFailed) => return Ok(Outcome::Retry),
                Err(err) => return Err(store_error(err)),
            }
        }
        Ok(Outcome::Done)
    }

    /// Folds the children's states into a parent currently applying.
    async fn reconcile_change_phase(
        &self,
        mut change: NetworkChange,
        children: Vec<DeviceChange>,
    ) -> Result<Outcome, ControllerError> {
        let rejected = children
            .iter()
            .any(|c| c.status.phase == Phase::Change && c.status.state == State::Failed);

        if rejected {
            if change.status.reason != Reason::Error {
                change.status.reason = Reason::Error;
                change.status.message = CHANGE_REJECTED.to_owned();
                warn!(change = %change.id, "change rejected by a device, rolling devices back");
                return match self.network_changes.update(&mut change).await {
                    Ok(()) => Ok(Outcome::Done),
                    Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
                    Err(err) => Err(store_error(err)),
                };
            }
            // The rejection is recorded; compensate by rolling every child
            // still applying back at the same incarnation. Children keep
            // their reason and message so the failure stays attributable.
            for mut child in children {
                if child.status.phase != Phase::Change {
                    continue;
                }
                child.status.phase = Phase::Rollback;
                child.status.state = self.target_state(Phase::Rollback, &child).await;
                match self.device_changes.update(&mut child).await {
                    Ok(()) => {}
                    Err(StoreError::WriteConditionFailed) => return Ok(Outcome::Retry),
                    Err(err) => return Err(store_error(err)),
                }
            }
            return Ok(Outcome::Done);
        }

        let complete = children
            .iter()
            .all(|c| c.status.phase == Phase::Change && c.status.state == State::Complete);
        if complete && change.status.state != State::Complete {
            change.status.state = State::Complete;
            info!(change = %change.id, incarnation = change.status.incarnation, "network change complete");
            return match self.network_changes.update(&mut change).await {
                Ok(()) => Ok(Outcome::Done),
                Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
                Err(err) => Err(store_error(err)),
            };
        }

        Ok(Outcome::Done)
    }

    /// Folds the children's states into a parent currently rolling back.
    async fn reconcile_rollback_phase(
        &self,
        mut change: NetworkChange,
        children: Vec<DeviceChange>,
    ) -> Result<Outcome, ControllerError> {
        let rejected = children
            .iter()
            .any(|c| c.status.phase == Phase::Rollback && c.status.state == State::Failed);

        if rejected {
            if change.status.reason != Reason::Error {
                change.status.reason = Reason::Error;
                change.status.message = ROLLBACK_REJECTED.to_owned();
                warn!(change = %change.id, "rollback rejected by a device");
                return match self.network_changes.update(&mut change).await {
                    Ok(()) => Ok(Outcome::Done),
                    Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
                    Err(err) => Err(store_error(err)),
                };
            }
            // A device that rejected its rollback may still hold the change;
            // re-apply to just that device so it converges to a known state.
            // Children that rolled back cleanly stay rolled back.
            for mut child in children {
                if child.status.phase != Phase::Rollback || child.status.state != State::Failed {
                    continue;
                }
                child.status.phase = Phase::Change;
                child.status.state = State::Pending;
                match self.device_changes.update(&mut child).await {
                    Ok(()) => {}
                    Err(StoreError::WriteConditionFailed) => return Ok(Outcome::Retry),
                    Err(err) => return Err(store_error(err)),
                }
            }
            return Ok(Outcome::Done);
        }

        let complete = children
            .iter()
            .all(|c| c.status.phase == Phase::Rollback && c.status.state == State::Complete);
        if complete && change.status.state != State::Complete {
            change.status.state = State::Complete;
            info!(change = %change.id, incarnation = change.status.incarnation, "network change rolled back");
            return match self.network_changes.update(&mut change).await {
                Ok(()) => Ok(Outcome::Done),
                Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
                Err(err) => Err(store_error(err)),
            };
        }

        Ok(Outcome::Done)
    }
}

#[async_trait]
impl Reconciler for NetworkChangeReconciler {
    type Id = NetworkChangeId;

    async fn reconcile(&self, id: NetworkChangeId) -> Result<Outcome, ControllerError> {
        // Ownership can lapse between the filter's answer and the step.
        if !self.leadership.is_leader() {
            return Ok(Outcome::Done);
        }

        let Some(change) = self.network_changes.get(&id).await.map_err(store_error)? else {
            return Ok(Outcome::Done);
        };

        if change.refs.len() < change.changes.len() {
            return self.create_children(change).await;
        }

        let mut children = Vec::with_capacity(change.refs.len());
        for child_ref in &change.refs {
            match self
                .device_changes
                .get(&child_ref.device_change_id)
                .await
                .map_err(store_error)?
            {
                Some(child) => children.push(child),
                // A recorded child is missing; re-read after a backoff.
                None => return Ok(Outcome::Retry),
            }
        }

        if change.status.incarnation == 0 {
            return self.issue(change).await;
        }

        let newest_child = children
            .iter()
            .map(|c| c.status.incarnation)
            .max()
            .unwrap_or(0);
        if change.status.incarnation > newest_child {
            return self.propagate(&change, children).await;
        }

        match change.status.phase {
            Phase::Change => self.reconcile_change_phase(change, children).await,
            Phase::Rollback => self.reconcile_rollback_phase(change, children).await,
        }
    }
}
