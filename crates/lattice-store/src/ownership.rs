//! Leadership and mastership capability traits
//!
//! Both queries are evaluated on every reconcile step, so implementations
//! must answer from locally cached election state without blocking.

use lattice_core::DeviceId;

/// Cluster-wide single-writer token for network changes.
pub trait LeadershipStore: Send + Sync + 'static {
    /// Whether this node currently holds global leadership.
    fn is_leader(&self) -> bool;
}

/// Per-device single-writer token for that device's changes.
pub trait MastershipStore: Send + Sync + 'static {
    /// Whether this node currently holds mastership of the given device.
    fn is_master(&self, device: &DeviceId) -> bool;
}
