//! In-memory device registry and cache
//!
//! Hand-written fakes for the topology capability traits, used by unit and
//! integration tests and by single-process local development.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lattice_core::{DeviceId, DeviceVersion};
use lattice_topology::{Device, DeviceCache, DeviceRegistry, TopologyError};

/// In-memory implementation of [`DeviceRegistry`].
#[derive(Clone, Default)]
pub struct MockDeviceRegistry {
    devices: Arc<Mutex<HashMap<DeviceId, Device>>>,
}

impl MockDeviceRegistry {
    pub fn new() -> Self {
        MockDeviceRegistry::default()
    }

    /// Adds or replaces a device.
    pub async fn add(&self, device: Device) {
        self.devices.lock().await.insert(device.id.clone(), device);
    }

    pub async fn remove(&self, id: &DeviceId) {
        self.devices.lock().await.remove(id);
    }
}

#[async_trait]
impl DeviceRegistry for MockDeviceRegistry {
    async fn get(&self, id: &DeviceId) -> Result<Option<Device>, TopologyError> {
        Ok(self.devices.lock().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Device>, TopologyError> {
        Ok(self.devices.lock().await.values().cloned().collect())
    }
}

/// In-memory implementation of [`DeviceCache`].
#[derive(Clone, Default)]
pub struct MockDeviceCache {
    entries: Arc<Mutex<HashSet<(DeviceId, DeviceVersion)>>>,
}

impl MockDeviceCache {
    pub fn new() -> Self {
        MockDeviceCache::default()
    }

    pub async fn insert(&self, id: DeviceId, version: DeviceVersion) {
        self.entries.lock().await.insert((id, version));
    }

    pub async fn remove(&self, id: &DeviceId, version: &DeviceVersion) {
        self.entries
            .lock()
            .await
            .remove(&(id.clone(), version.clone()));
    }
}

#[async_trait]
impl DeviceCache for MockDeviceCache {
    async fn contains(&self, id: &DeviceId, version: &DeviceVersion) -> bool {
        self.entries
            .lock()
            .await
            .contains(&(id.clone(), version.clone()))
    }
}
