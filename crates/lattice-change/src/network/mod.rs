//! Network-change controller

mod reconciler;
mod watcher;

use std::sync::Arc;

use async_trait::async_trait;

use lattice_controller::{
    Controller, ControllerBuilder, ControllerError, Filter, PartitionKey, Partitioner,
};
use lattice_core::{NetworkChangeId, State};
use lattice_store::{DeviceChangeStore, LeadershipStore, NetworkChangeStore};
use lattice_topology::DeviceCache;

use reconciler::NetworkChangeReconciler;
use watcher::{ChildChangeWatcher, NetworkChangeWatcher};

/// Only the cluster leader runs network-change steps.
struct LeadershipFilter {
    leadership: Arc<dyn LeadershipStore>,
}

#[async_trait]
impl Filter for LeadershipFilter {
    type Id = NetworkChangeId;

    async fn accept(&self, _id: &NetworkChangeId) -> bool {
        self.leadership.is_leader()
    }
}

/// Drops items for changes that reached their steady state. A completed
/// change only becomes actionable again when a re-issue resets its state to
/// pending, and that write produces a fresh event.
struct TerminalStateFilter {
    store: Arc<dyn NetworkChangeStore>,
}

#[async_trait]
impl Filter for TerminalStateFilter {
    type Id = NetworkChangeId;

    async fn accept(&self, id: &NetworkChangeId) -> bool {
        match self.store.get(id).await {
            Ok(Some(change)) => change.status.state != State::Complete,
            Ok(None) => false,
            // Let the reconciler surface store problems as retries.
            Err(_) => true,
        }
    }
}

/// One partition per network change; ordering across changes is not required.
struct NetworkChangePartitioner;

impl Partitioner for NetworkChangePartitioner {
    type Id = NetworkChangeId;

    fn partition(&self, id: &NetworkChangeId) -> PartitionKey {
        PartitionKey::new(id.as_str())
    }
}

/// Assembles the network-change controller.
///
/// The controller watches both stores: network-change events schedule the
/// change itself, device-change events schedule the parent of the row that
/// changed, so child completions and failures wake the parent's reconciler.
pub fn new_controller(
    leadership: Arc<dyn LeadershipStore>,
    device_cache: Arc<dyn DeviceCache>,
    network_changes: Arc<dyn NetworkChangeStore>,
    device_changes: Arc<dyn DeviceChangeStore>,
) -> Result<Controller<NetworkChangeId>, ControllerError> {
    ControllerBuilder::new("network-change")
        .watch(NetworkChangeWatcher::new(network_changes.clone()))
        .watch(ChildChangeWatcher::new(device_changes.clone()))
        .filter(LeadershipFilter {
            leadership: leadership.clone(),
        })
        .filter(TerminalStateFilter {
            store: network_changes.clone(),
        })
        .partition(NetworkChangePartitioner)
        .reconcile(NetworkChangeReconciler::new(
            leadership,
            device_cache,
            network_changes,
            device_changes,
        ))
        .build()
}
