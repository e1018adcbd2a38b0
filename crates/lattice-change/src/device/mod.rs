//! Device-change controller

mod reconciler;
mod watcher;

use std::sync::Arc;

use async_trait::async_trait;

use lattice_controller::{
    Controller, ControllerBuilder, ControllerError, Filter, PartitionKey, Partitioner,
};
use lattice_core::{DeviceChangeId, State};
use lattice_southbound::SessionRegistry;
use lattice_store::{DeviceChangeStore, MastershipStore};
use lattice_topology::{DeviceCache, DeviceRegistry};

use reconciler::DeviceChangeReconciler;
use watcher::DeviceChangeWatcher;

/// Only the master of a row's device runs steps for that row.
struct MastershipFilter {
    mastership: Arc<dyn MastershipStore>,
}

#[async_trait]
impl Filter for MastershipFilter {
    type Id = DeviceChangeId;

    async fn accept(&self, id: &DeviceChangeId) -> bool {
        match id.device_id() {
            Ok(device) => self.mastership.is_master(&device),
            Err(_) => false,
        }
    }
}

/// Drops items for rows with no work due: never issued by the parent, or
/// already settled for their incarnation. A re-issue rewrites the row to
/// pending and produces a fresh event.
struct TerminalStateFilter {
    store: Arc<dyn DeviceChangeStore>,
}

#[async_trait]
impl Filter for TerminalStateFilter {
    type Id = DeviceChangeId;

    async fn accept(&self, id: &DeviceChangeId) -> bool {
        match self.store.get(id).await {
            Ok(Some(change)) => {
                change.status.state == State::Pending && change.status.incarnation > 0
            }
            Ok(None) => false,
            // Let the reconciler surface store problems as retries.
            Err(_) => true,
        }
    }
}

/// One partition per device: a device sees one request at a time, while
/// different devices proceed in parallel.
struct DevicePartitioner;

impl Partitioner for DevicePartitioner {
    type Id = DeviceChangeId;

    fn partition(&self, id: &DeviceChangeId) -> PartitionKey {
        match id.device_id() {
            Ok(device) => PartitionKey::new(device.as_str()),
            Err(_) => PartitionKey::new(id.as_str()),
        }
    }
}

/// Assembles the device-change controller.
pub fn new_controller(
    mastership: Arc<dyn MastershipStore>,
    devices: Arc<dyn DeviceRegistry>,
    device_cache: Arc<dyn DeviceCache>,
    device_changes: Arc<dyn DeviceChangeStore>,
    sessions: Arc<SessionRegistry>,
) -> Result<Controller<DeviceChangeId>, ControllerError> {
    ControllerBuilder::new("device-change")
        .watch(DeviceChangeWatcher::new(device_changes.clone()))
        .filter(MastershipFilter {
            mastership: mastership.clone(),
        })
        .filter(TerminalStateFilter {
            store: device_changes.clone(),
        })
        .partition(DevicePartitioner)
        .reconcile(DeviceChangeReconciler::new(
            mastership,
            devices,
            device_cache,
            device_changes,
            sessions,
        ))
        .build()
}
