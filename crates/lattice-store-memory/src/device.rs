//! In-memory device change store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use lattice_core::{DeviceChange, DeviceChangeId, DeviceId, DeviceVersion, Revision};
use lattice_store::{DeviceChangeStore, EventKind, StoreError, WatchEvent, WatchHandle, WatchOptions};

use crate::EVENT_BUFFER;

struct Registration {
    tx: mpsc::Sender<WatchEvent<DeviceChange>>,
    /// When set, only changes targeting this `(device, version)` are delivered.
    scope: Option<(DeviceId, DeviceVersion)>,
}

impl Registration {
    fn matches(&self, change: &DeviceChange) -> bool {
        match &self.scope {
            Some((device, version)) => {
                change.change.device_id == *device && change.change.device_version == *version
            }
            None => true,
        }
    }
}

struct State {
    objects: BTreeMap<DeviceChangeId, DeviceChange>,
    watchers: Vec<Registration>,
}

/// In-memory implementation of [`DeviceChangeStore`].
#[derive(Clone)]
pub struct MemoryDeviceChangeStore {
    state: Arc<Mutex<State>>,
}

impl MemoryDeviceChangeStore {
    pub fn new() -> Self {
        MemoryDeviceChangeStore {
            state: Arc::new(Mutex::new(State {
                objects: BTreeMap::new(),
                watchers: Vec::new(),
            })),
        }
    }

    async fn register(
        &self,
        scope: Option<(DeviceId, DeviceVersion)>,
        options: WatchOptions,
    ) -> WatchHandle<DeviceChange> {
        let mut state = self.state.lock().await;
        let (tx, rx) = mpsc::channel(state.objects.len() + EVENT_BUFFER);
        let registration = Registration { tx, scope };
        if options.replay {
            for object in state.objects.values() {
                if registration.matches(object) {
                    let _ = registration.tx.try_send(WatchEvent {
                        kind: EventKind::Created,
                        object: object.clone(),
                    });
                }
            }
        }
        state.watchers.push(registration);
        WatchHandle::new(rx)
    }
}

impl Default for MemoryDeviceChangeStore {
    fn default() -> Self {
        MemoryDeviceChangeStore::new()
    }
}

async fn publish(state: &mut State, event: WatchEvent<DeviceChange>) {
    let watchers = std::mem::take(&mut state.watchers);
    for registration in watchers {
        if !registration.matches(&event.object) {
            state.watchers.push(registration);
            continue;
        }
        if registration.tx.send(event.clone()).await.is_ok() {
            state.watchers.push(registration);
        }
    }
}

#[async_trait]
impl DeviceChangeStore for MemoryDeviceChangeStore {
    async fn create(&self, change: &mut DeviceChange) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.objects.contains_key(&change.id) {
            return Err(StoreError::AlreadyExists(change.id.to_string()));
        }
        change.revision = Revision::initial();
        state.objects.insert(change.id.clone(), change.clone());
        debug!(id = %change.id, "created device change");
        publish(
            &mut state,
            WatchEvent {
                kind: EventKind::Created,
                object: change.clone(),
            },
        )
        .await;
        Ok(())
    }

    async fn get(&self, id: &DeviceChangeId) -> Result<Option<DeviceChange>, StoreError> {
        Ok(self.state.lock().await.objects.get(id).cloned())
    }

    async fn update(&self, change: &mut DeviceChange) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let current = state
            .objects
            .get(&change.id)
            .ok_or_else(|| StoreError::NotFound(change.id.to_string()))?;
        if current.revision != change.revision {
            return Err(StoreError::WriteConditionFailed);
        }
        change.revision = change.revision.next();
        state.objects.insert(change.id.clone(), change.clone());
        debug!(id = %change.id, revision = %change.revision, "updated device change");
        publish(
            &mut state,
            WatchEvent {
                kind: EventKind::Updated,
                object: change.clone(),
            },
        )
        .await;
        Ok(())
    }

    async fn watch(&self, options: WatchOptions) -> Result<WatchHandle<DeviceChange>, StoreError> {
        Ok(self.register(None, options).await)
    }

    async fn watch_device(
        &self,
        device: &DeviceId,
        version: &DeviceVersion,
        options: WatchOptions,
    ) -> Result<WatchHandle<DeviceChange>, StoreError> {
        Ok(self
            .register(Some((device.clone(), version.clone())), options)
            .await)
    }
}
