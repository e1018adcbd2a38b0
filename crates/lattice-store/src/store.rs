//! Change store traits

use async_trait::async_trait;

use lattice_core::{
    DeviceChange, DeviceChangeId, DeviceId, DeviceVersion, NetworkChange, NetworkChangeId,
};

use crate::error::StoreError;
use crate::event::{WatchHandle, WatchOptions};

/// Persistent, watchable store of [`NetworkChange`] objects.
#[async_trait]
pub trait NetworkChangeStore: Send + Sync + 'static {
    /// Persists a new change, assigning its initial revision.
    async fn create(&self, change: &mut NetworkChange) -> Result<(), StoreError>;

    async fn get(&self, id: &NetworkChangeId) -> Result<Option<NetworkChange>, StoreError>;

    /// Revision-conditional update. On success the object's revision is
    /// advanced in place; on [`StoreError::WriteConditionFailed`] the object
    /// is left untouched.
    async fn update(&self, change: &mut NetworkChange) -> Result<(), StoreError>;

    async fn watch(&self, options: WatchOptions)
    -> Result<WatchHandle<NetworkChange>, StoreError>;
}

/// Persistent, watchable store of [`DeviceChange`] objects.
#[async_trait]
pub trait DeviceChangeStore: Send + Sync + 'static {
    /// Persists a new change, assigning its initial revision.
    async fn create(&self, change: &mut DeviceChange) -> Result<(), StoreError>;

    async fn get(&self, id: &DeviceChangeId) -> Result<Option<DeviceChange>, StoreError>;

    /// Revision-conditional update with the same contract as
    /// [`NetworkChangeStore::update`].
    async fn update(&self, change: &mut DeviceChange) -> Result<(), StoreError>;

    /// Watch all device changes.
    async fn watch(&self, options: WatchOptions) -> Result<WatchHandle<DeviceChange>, StoreError>;

    /// Watch only the changes targeting one `(device, version)`.
    async fn watch_device(
        &self,
        device: &DeviceId,
        version: &DeviceVersion,
        options: WatchOptions,
    ) -> Result<WatchHandle<DeviceChange>, StoreError>;
}
