//! Watcher feeding the device-change controller

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use lattice_controller::{ControllerError, Watcher};
use lattice_core::DeviceChangeId;
use lattice_store::{DeviceChangeStore, WatchOptions};

/// Schedules a device change whenever it is written.
pub(crate) struct DeviceChangeWatcher {
    store: Arc<dyn DeviceChangeStore>,
}

impl DeviceChangeWatcher {
    pub(crate) fn new(store: Arc<dyn DeviceChangeStore>) -> Self {
        DeviceChangeWatcher { store }
    }
}

#[async_trait]
impl Watcher for DeviceChangeWatcher {
    type Id = DeviceChangeId;

    async fn start(
        &self,
        queue: mpsc::Sender<DeviceChangeId>,
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
