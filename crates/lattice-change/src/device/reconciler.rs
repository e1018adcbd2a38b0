//! Device-change reconciliation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use lattice_controller::{ControllerError, Outcome, Reconciler};
use lattice_core::{ChangeOp, DeviceChange, DeviceChangeId, Phase, Reason, State};
use lattice_southbound::{DeviceTarget, SessionRegistry, SetRequest, WireError};
use lattice_store::{DeviceChangeStore, MastershipStore, StoreError};
use lattice_topology::{Device, DeviceCache, DeviceRegistry};

/// Drives one device change per step: translate the row's operations into a
/// single `Set` request, send it, and record the outcome.
///
/// A device error is terminal within the row's incarnation: it is written as
/// `FAILED` and surfaced upward, and the network-change controller decides
/// whether to compensate. Only store-level conflicts are retried here.
pub(crate) struct DeviceChangeReconciler {
    mastership: Arc<dyn MastershipStore>,
    devices: Arc<dyn DeviceRegistry>,
    device_cache: Arc<dyn DeviceCache>,
    device_changes: Arc<dyn DeviceChangeStore>,
    sessions: Arc<SessionRegistry>,
}

fn store_error(err: StoreError) -> ControllerError {
    ControllerError::Store(err.to_string())
}

impl DeviceChangeReconciler {
    pub(crate) fn new(
        mastership: Arc<dyn MastershipStore>,
        devices: Arc<dyn DeviceRegistry>,
        device_cache: Arc<dyn DeviceCache>,
        device_changes: Arc<dyn DeviceChangeStore>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        DeviceChangeReconciler {
            mastership,
            devices,
            device_cache,
            device_changes,
            sessions,
        }
    }

    /// The request for the row's current phase: the forward operation set
    /// when applying, the inverse set when rolling back.
    fn build_request(change: &DeviceChange) -> SetRequest {
        match change.status.phase {
            Phase::Change => SetRequest::from_ops(&change.change.ops),
            Phase::Rollback => {
                let inverse: Vec<ChangeOp> =
                    change.change.ops.iter().map(ChangeOp::inverse).collect();
                SetRequest::from_ops(&inverse)
            }
        }
    }

    /// Sends one request on the device session, bounded by the device's
    /// configured timeout and aborted if the session is cancelled.
    async fn send(
        &self,
        device: &Device,
        target: Arc<dyn DeviceTarget>,
        request: SetRequest,
    ) -> Result<(), WireError> {
        let session = target.context();
        let call = async {
            match device.timeout {
                Some(timeout) => match tokio::time::timeout(timeout, target.set(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(WireError::deadline_exceeded(format!(
                        "set request to {} timed out",
                        device.id
                    ))),
                },
                None => target.set(request).await,
            }
        };
        tokio::select! {
            _ = session.cancelled() => Err(WireError::cancelled(format!(
                "session to {} closed",
                device.id
            ))),
            result = call => result.map(|_| ()),
        }
    }

    /// Records the outcome of the device call. A success only advances the
    /// state: phase, incarnation, reason, and message stay as they are, so a
    /// rolled-back row keeps the wire text of the failure that caused the
    /// rollback.
    async fn record(
        &self,
        mut change: DeviceChange,
        result: Result<(), WireError>,
    ) -> Result<Outcome, ControllerError> {
        match result {
            Ok(()) => {
                change.status.state = State::Complete;
                info!(change = %change.id, phase = ?change.status.phase, "device change applied");
            }
            Err(err) => {
                change.status.state = State::Failed;
                change.status.reason = Reason::Error;
                change.status.message = err.to_string();
                warn!(change = %change.id, phase = ?change.status.phase, %err, "device rejected change");
            }
        }
        match self.device_changes.update(&mut change).await {
            Ok(()) => Ok(Outcome::Done),
            Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
            Err(err) => Err(store_error(err)),
        }
    }
}

#[async_trait]
impl Reconciler for DeviceChangeReconciler {
    type Id = DeviceChangeId;

    async fn reconcile(&self, id: DeviceChangeId) -> Result<Outcome, ControllerError> {
        let Some(mut change) = self.device_changes.get(&id).await.map_err(store_error)? else {
            return Ok(Outcome::Done);
        };

        // Ownership can lapse between the filter's answer and the step.
        if !self.mastership.is_master(&change.change.device_id) {
            return Ok(Outcome::Done);
        }
        if change.status.state != State::Pending {
            return Ok(Outcome::Done);
        }
        // Incarnation 0 rows exist but have not been issued by the parent.
        if change.status.incarnation == 0 {
            return Ok(Outcome::Done);
        }

        let cached = self
            .device_cache
            .contains(&change.change.device_id, &change.change.device_version)
            .await;
        if !cached {
            return match change.status.phase {
                // Nothing was ever applied to a device we cannot reach, so
                // there is nothing to undo.
                Phase::Rollback => {
                    change.status.state = State::Complete;
                    debug!(change = %change.id, "device not in cache, rollback is a no-op");
                    match self.device_changes.update(&mut change).await {
                        Ok(()) => Ok(Outcome::Done),
                        Err(StoreError::WriteConditionFailed) => Ok(Outcome::Retry),
                        Err(err) => Err(store_error(err)),
                    }
                }
                // The change waits for the device to connect.
                Phase::Change => Ok(Outcome::Done),
            };
        }

        let Some(device) = self
            .devices
            .get(&change.change.device_id)
            .await
            .map_err(|err| ControllerError::Store(err.to_string()))?
        else {
            warn!(change = %change.id, device = %change.change.device_id,
                "device in cache but not in registry");
            return Ok(Outcome::Retry);
        };

        let request = Self::build_request(&change);
        debug!(change = %change.id, device = %device.id, %request, "sending set request");
        let result = match self.sessions.session(&device).await {
            Ok(target) => self.send(&device, target, request).await,
            // Failing to open the session is a device-level failure like any
            // other rejection.
            Err(err) => Err(err),
        };
        self.record(change, result).await
    }
}
