//! Capability traits for device discovery

use async_trait::async_trait;

use lattice_core::{DeviceId, DeviceVersion};

use crate::device::Device;
use crate::error::TopologyError;

/// Read access to the device registry.
///
/// Production implementations wrap the topology service client; tests use the
/// in-memory registry from `lattice-topology-mock`.
#[async_trait]
pub trait DeviceRegistry: Send + Sync + 'static {
    /// Looks up a device by ID, returning `None` when unknown.
    async fn get(&self, id: &DeviceId) -> Result<Option<Device>, TopologyError>;

    /// All devices currently known to the registry.
    async fn list(&self) -> Result<Vec<Device>, TopologyError>;
}

/// The set of `(device, version)` pairs currently configurable through this
/// controller. Membership gates whether the device-change controller contacts
/// a device at all.
#[async_trait]
pub trait DeviceCache: Send + Sync + 'static {
    async fn contains(&self, id: &DeviceId, version: &DeviceVersion) -> bool;
}
