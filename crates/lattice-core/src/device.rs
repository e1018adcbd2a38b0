//! Device-level change objects

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::NetworkChangeId;
use crate::status::Status;
use crate::types::{DeviceId, DeviceVersion, Revision};
use crate::value::ChangeOp;

/// Error raised when a device change ID does not have the derived form.
#[derive(Debug, Clone, Error)]
#[error("malformed device change id: {0}")]
pub struct MalformedIdError(String);

/// Identifier of a device change, derived deterministically from its parent
/// as `{network change}:{device}:{version}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceChangeId(String);

impl DeviceChangeId {
    /// Derives the ID for one device's portion of a network change.
    pub fn derive(
        network_change: &NetworkChangeId,
        device: &DeviceId,
        version: &DeviceVersion,
    ) -> Self {
        DeviceChangeId(format!("{network_change}:{device}:{version}"))
    }

    pub fn new(id: impl Into<String>) -> Self {
        DeviceChangeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The device component of the ID.
    ///
    /// The network change ID may itself contain `:` so the ID is parsed from
    /// the right: the last segment is the version, the one before it the
    /// device.
    pub fn device_id(&self) -> Result<DeviceId, MalformedIdError> {
        let mut parts = self.0.rsplitn(3, ':');
        let _version = parts.next();
        match parts.next() {
            Some(device) if parts.next().is_some() => Ok(DeviceId::new(device)),
            _ => Err(MalformedIdError(self.0.clone())),
        }
    }

    /// The device version component of the ID.
    pub fn device_version(&self) -> Result<DeviceVersion, MalformedIdError> {
        let mut parts = self.0.rsplitn(3, ':');
        match parts.next() {
            Some(version) if parts.next().is_some() && parts.next().is_some() => {
                Ok(DeviceVersion::new(version))
            }
            _ => Err(MalformedIdError(self.0.clone())),
        }
    }
}

impl fmt::Display for DeviceChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One device's portion of a network change: the target `(device, version)`
/// and the ordered typed operations to apply there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceChangeSpec {
    pub device_id: DeviceId,
    pub device_version: DeviceVersion,
    pub ops: Vec<ChangeOp>,
}

impl DeviceChangeSpec {
    pub fn new(
        device_id: impl Into<DeviceId>,
        device_version: impl Into<DeviceVersion>,
        ops: Vec<ChangeOp>,
    ) -> Self {
        DeviceChangeSpec {
            device_id: device_id.into(),
            device_version: device_version.into(),
            ops,
        }
    }
}

/// A device change row: the unit the device-change controller reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceChange {
    pub id: DeviceChangeId,
    /// Parent network change this row belongs to
    pub network_change: NetworkChangeId,
    pub change: DeviceChangeSpec,
    pub status: Status,
    pub revision: Revision,
}

impl DeviceChange {
    /// Creates the row for one entry of a parent network change, copying the
    /// parent's phase and incarnation with a clean pending state.
    pub fn for_network_change(
        network_change: &NetworkChangeId,
        spec: DeviceChangeSpec,
        status: Status,
    ) -> Self {
        let id = DeviceChangeId::derive(network_change, &spec.device_id, &spec.device_version);
        DeviceChange {
            id,
            network_change: network_change.clone(),
            change: spec,
            status,
            revision: Revision::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derivation_matches_contract_form() {
        let id = DeviceChangeId::derive(
            &NetworkChangeId::new("change-1"),
            &DeviceId::new("device-1"),
            &DeviceVersion::new("1.0.0"),
        );
        assert_eq!(id.as_str(), "change-1:device-1:1.0.0");
    }

    #[test]
    fn id_components_parse_from_the_right() {
        let id = DeviceChangeId::new("my:change:device-2:1.0.0");
        assert_eq!(id.device_id().unwrap(), DeviceId::new("device-2"));
        assert_eq!(id.device_version().unwrap(), DeviceVersion::new("1.0.0"));
    }

    #[test]
    fn malformed_id_is_rejected() {
        let id = DeviceChangeId::new("no-separators");
        assert!(id.device_id().is_err());
    }
}
