//! Device entity type

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lattice_core::{DeviceId, DeviceVersion, Revision};

/// Credentials for connecting to a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User with which to connect to the device
    pub user: String,
    /// Password for connecting to the device
    pub password: String,
}

/// TLS material and policy for connecting to a device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Name of the device's CA certificate
    pub ca_cert: String,
    /// Name of the device's certificate
    pub cert: String,
    /// Name of the device's TLS key
    pub key: String,
    /// Connect to the device over plaintext
    pub plain: bool,
    /// Skip verification of the device's certificate
    pub insecure: bool,
}

/// Connectivity of one southbound protocol on a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityState {
    #[default]
    Unknown,
    Reachable,
    Unreachable,
}

/// State of one southbound protocol on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolState {
    /// Protocol name, e.g. `gnmi`
    pub protocol: String,
    pub connectivity: ConnectivityState,
}

/// A configurable device known to the topology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Globally unique device identifier
    pub id: DeviceId,
    /// `host:port` of the device
    pub address: String,
    /// Device target name on shared endpoints
    pub target: String,
    /// Device software version
    pub version: DeviceVersion,
    /// Per-request timeout for southbound calls
    pub timeout: Option<Duration>,
    pub credentials: Credentials,
    pub tls: TlsConfig,
    /// Kind of the device, e.g. `devicesim`
    pub device_type: String,
    /// Role the device plays in the network, e.g. `leaf`
    pub role: String,
    pub protocols: Vec<ProtocolState>,
    /// User-friendly tag
    pub display_name: String,
    /// Arbitrary attribute keys/values carried through from the topology object
    pub attributes: HashMap<String, String>,
    /// Revision of the underlying topology object
    pub revision: Revision,
}

impl Device {
    pub fn new(id: impl Into<DeviceId>, address: impl Into<String>, version: impl Into<DeviceVersion>) -> Self {
        Device {
            id: id.into(),
            address: address.into(),
            version: version.into(),
            ..Device::default()
        }
    }
}
