//! Local (single node) leadership and mastership stores
//!
//! A single-node election trivially elects the local node, so these stores
//! default to owning everything. Tests flip ownership off to exercise the
//! controllers' ownership guards.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use lattice_core::DeviceId;
use lattice_store::{LeadershipStore, MastershipStore};

/// Always-elected leadership store for a single-node deployment.
pub struct LocalLeadershipStore {
    leader: AtomicBool,
}

impl LocalLeadershipStore {
    pub fn new() -> Self {
        LocalLeadershipStore {
            leader: AtomicBool::new(true),
        }
    }

    /// Overrides the election outcome; used to simulate losing leadership.
    pub fn set_leader(&self, leader: bool) {
        self.leader.store(leader, Ordering::SeqCst);
    }
}

impl Default for LocalLeadershipStore {
    fn default() -> Self {
        LocalLeadershipStore::new()
    }
}

impl LeadershipStore for LocalLeadershipStore {
    fn is_leader(&self) -> bool {
        self.leader.load(Ordering::SeqCst)
    }
}

/// Mastership store for a single-node deployment: master of every device
/// unless a test overrides a specific one.
pub struct LocalMastershipStore {
    default_master: AtomicBool,
    overrides: Mutex<HashMap<DeviceId, bool>>,
}

impl LocalMastershipStore {
    pub fn new() -> Self {
        LocalMastershipStore {
            default_master: AtomicBool::new(true),
            overrides: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides mastership of one device.
    pub fn set_master(&self, device: DeviceId, master: bool) {
        self.overrides
            .lock()
            .expect("mastership overrides poisoned")
            .insert(device, master);
    }

    /// Overrides the default for devices with no explicit entry.
    pub fn set_default_master(&self, master: bool) {
        self.default_master.store(master, Ordering::SeqCst);
    }
}

impl Default for LocalMastershipStore {
    fn default() -> Self {
        LocalMastershipStore::new()
    }
}

impl MastershipStore for LocalMastershipStore {
    fn is_master(&self, device: &DeviceId) -> bool {
        self.overrides
            .lock()
            .expect("mastership overrides poisoned")
            .get(device)
            .copied()
            .unwrap_or_else(|| self.default_master.load(Ordering::SeqCst))
    }
}
