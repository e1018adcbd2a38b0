//! In-memory network change store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use lattice_core::{NetworkChange, NetworkChangeId, Revision};
use lattice_store::{EventKind, NetworkChangeStore, StoreError, WatchEvent, WatchHandle, WatchOptions};

use crate::EVENT_BUFFER;

struct State {
    objects: BTreeMap<NetworkChangeId, NetworkChange>,
    watchers: Vec<mpsc::Sender<WatchEvent<NetworkChange>>>,
}

/// In-memory implementation of [`NetworkChangeStore`].
#[derive(Clone)]
pub struct MemoryNetworkChangeStore {
    state: Arc<Mutex<State>>,
}

impl MemoryNetworkChangeStore {
    pub fn new() -> Self {
        MemoryNetworkChangeStore {
            state: Arc::new(Mutex::new(State {
                objects: BTreeMap::new(),
                watchers: Vec::new(),
            })),
        }
    }
}

impl Default for MemoryNetworkChangeStore {
    fn default() -> Self {
        MemoryNetworkChangeStore::new()
    }
}

async fn publish(state: &mut State, event: WatchEvent<NetworkChange>) {
    let watchers = std::mem::take(&mut state.watchers);
    for tx in watchers {
        if tx.send(event.clone()).await.is_ok() {
            state.watchers.push(tx);
        }
    }
}

#[async_trait]
impl NetworkChangeStore for MemoryNetworkChangeStore {
    async fn create(&self, change: &mut NetworkChange) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.objects.contains_key(&change.id) {
            return Err(StoreError::AlreadyExists(change.id.to_string()));
        }
        change.revision = Revision::initial();
        state.objects.insert(change.id.clone(), change.clone());
        debug!(id = %change.id, "created network change");
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

    async fn get(&self, id: &NetworkChangeId) -> Result<Option<NetworkChange>, StoreError> {
        Ok(self.state.lock().await.objects.get(id).cloned())
    }

    async fn update(&self, change: &mut NetworkChange) -> Result<(), StoreError> {
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
        debug!(id = %change.id, revision = %change.revision, "updated network change");
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

    async fn watch(
        &self,
        options: WatchOptions,
    ) -> Result<WatchHandle<NetworkChange>, StoreError> {
        let mut state = self.state.lock().await;
        let (tx, rx) = mpsc::channel(state.objects.len() + EVENT_BUFFER);
        if options.replay {
            for object in state.objects.values() {
                // Capacity covers the whole snapshot, so this cannot fail.
                let _ = tx.try_send(WatchEvent {
                    kind: EventKind::Created,
                    object: object.clone(),
                });
            }
        }
        state.watchers.push(tx);
        Ok(WatchHandle::new(rx))
    }
}
