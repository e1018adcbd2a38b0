//! Watchers feeding the network-change controller

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lattice_controller::{ControllerError, Watcher};
use lattice_core::NetworkChangeId;
use lattice_store::{DeviceChangeStore, NetworkChangeStore, WatchOptions};

/// Schedules a network change whenever it is written.
pub(crate) struct NetworkChangeWatcher {
    store: Arc<dyn NetworkChangeStore>,
}

impl NetworkChangeWatcher {
    pub(crate) fn new(store: Arc<dyn NetworkChangeStore>) -> Self {
        NetworkChangeWatcher { store }
    }
}

#[async_trait]
impl Watcher for NetworkChangeWatcher {
    type Id = NetworkChangeId;

    async fn start(
        &self,
        queue: mpsc::Sender<NetworkChangeId>,
        token: CancellationToken,
    ) -> Result<(), ControllerError> {
        let mut handle = self
            .store
            .watch(WatchOptions::replay())
            .await
            .map_err(|err| ControllerError::Watch(err.to_string()))?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = handle.recv() => match event {
                        Some(event) => {
                            if queue.send(event.object.id).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
        Ok(())
    }
}

/// Schedules the parent network change whenever one of its device change rows
/// is written, so child progress drives the parent's aggregation.
pub(crate) struct ChildChangeWatcher {
    store: Arc<dyn DeviceChangeStore>,
}

impl ChildChangeWatcher {
    pub(crate) fn new(store: Arc<dyn DeviceChangeStore>) -> Self {
        ChildChangeWatcher { store }
    }
}

#[async_trait]
impl Watcher for ChildChangeWatcher {
    type Id = NetworkChangeId;

    async fn start(
        &self,
        queue: mpsc::Sender<NetworkChangeId>,
        token: CancellationToken,
    ) -> Result<(), ControllerError> {
        let mut handle = self
            .store
            .watch(WatchOptions::replay())
            .await
            .map_err(|err| ControllerError::Watch(err.to_string()))?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = handle.recv() => match event {
                        Some(event) => {
                            if queue.send(event.object.network_change).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
        Ok(())
    }
}
