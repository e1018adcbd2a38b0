//! In-memory (single process) implementations of the Lattice stores
//!
//! Used by tests and local development. The stores honor the full store
//! contract: revision assignment on create, revision-conditional updates
//! failing with `write condition failed`, and watches with optional replay
//! that observe every write in order.

mod device;
mod network;
mod ownership;

pub use device::MemoryDeviceChangeStore;
pub use network::MemoryNetworkChangeStore;
pub use ownership::{LocalLeadershipStore, LocalMastershipStore};

/// Headroom on watch channels beyond the replayed snapshot.
pub(crate) const EVENT_BUFFER: usize = 128;
