//! Session registry
//!
//! Holds at most one session per `(device, version)`. Creation goes through
//! the injected [`Connector`] under a per-device lock, so concurrent
//! reconcile steps for the same device never race session creation; steps for
//! different devices dial in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use lattice_core::{DeviceId, DeviceVersion};
use lattice_topology::Device;

use crate::error::WireError;
use crate::target::DeviceTarget;

/// Dials a new session to a device using its address, credentials, and TLS
/// configuration.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceTarget>, WireError>;
}

type SessionKey = (DeviceId, DeviceVersion);

/// Process-wide table of open device sessions, injected into the
/// device-change controller at construction time.
pub struct SessionRegistry {
    connector: Arc<dyn Connector>,
    sessions: Mutex<HashMap<SessionKey, Arc<dyn DeviceTarget>>>,
    creation_locks: Mutex<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        SessionRegistry {
            connector,
            sessions: Mutex::new(HashMap::new()),
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    fn key(device: &Device) -> SessionKey {
        (device.id.clone(), device.version.clone())
    }

    /// The session for a device, dialing at most once per `(device, version)`.
    pub async fn session(&self, device: &Device) -> Result<Arc<dyn DeviceTarget>, WireError> {
        let key = Self::key(device);
        if let Some(target) = self.sessions.lock().await.get(&key) {
            return Ok(target.clone());
        }

        let creation_lock = {
            let mut locks = self.creation_locks.lock().await;
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = creation_lock.lock().await;

        // Another step may have connected while we waited for the lock.
        if let Some(target) = self.sessions.lock().await.get(&key) {
            return Ok(target.clone());
        }

        info!(device = %device.id, address = %device.address, "connecting device session");
        let target = self.connector.connect(device).await?;
        self.sessions.lock().await.insert(key, target.clone());
        Ok(target)
    }

    /// Pre-registers a session, replacing any existing one. Used by tests and
    /// by callers that manage connections themselves.
    pub async fn register(
        &self,
        device: DeviceId,
        version: DeviceVersion,
        target: Arc<dyn DeviceTarget>,
    ) {
        self.sessions.lock().await.insert((device, version), target);
    }

    /// Drops a device's session, cancelling its context so in-flight calls
    /// abort. The next use reconnects.
    pub async fn evict(&self, device: &DeviceId, version: &DeviceVersion) {
        let key = (device.clone(), version.clone());
        if let Some(target) = self.sessions.lock().await.remove(&key) {
            debug!(device = %device, "evicting device session");
            target.context().cancel();
        }
    }
}
