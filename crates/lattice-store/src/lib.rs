//! Store capability traits for Lattice
//!
//! The reconciliation controllers coordinate exclusively through watched,
//! versioned object stores. Every update is revision-conditional: the caller
//! supplies the revision it read, and the store rejects the write with
//! [`StoreError::WriteConditionFailed`] when that revision is stale. This is
//! the sole cross-node synchronization primitive; leadership and mastership
//! only prune which node attempts a write.

pub mod error;
pub mod event;
pub mod ownership;
pub mod store;

pub use error::StoreError;
pub use event::{EventKind, WatchEvent, WatchHandle, WatchOptions};
pub use ownership::{LeadershipStore, MastershipStore};
pub use store::{DeviceChangeStore, NetworkChangeStore};
