//! Conversion between devices and generic topology objects
//!
//! The topology service stores entities as flat attribute maps. Each device
//! field is stored under its own attribute key; in particular the three TLS
//! material fields (`tls-key`, `tls-ca-cert`, `tls-cert`) are distinct keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lattice_core::{DeviceId, DeviceVersion, Revision};

use crate::device::{Credentials, Device, ProtocolState, TlsConfig};
use crate::error::TopologyError;

pub const ATTR_TYPE: &str = "type";
pub const ATTR_ROLE: &str = "role";
pub const ATTR_ADDRESS: &str = "address";
pub const ATTR_TARGET: &str = "target";
pub const ATTR_VERSION: &str = "version";
pub const ATTR_DISPLAY_NAME: &str = "displayname";
pub const ATTR_TLS_PLAIN: &str = "tls-plain";
pub const ATTR_TLS_INSECURE: &str = "tls-insecure";
pub const ATTR_TLS_KEY: &str = "tls-key";
pub const ATTR_TLS_CA_CERT: &str = "tls-ca-cert";
pub const ATTR_TLS_CERT: &str = "tls-cert";

/// Generic topology entity: an ID, a kind, a flat attribute map, and the
/// entity's southbound protocol states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    pub id: String,
    pub kind: String,
    pub attributes: HashMap<String, String>,
    pub protocols: Vec<ProtocolState>,
    pub revision: Revision,
}

fn set_attribute(attributes: &mut HashMap<String, String>, key: &str, value: &str) {
    if !value.is_empty() {
        attributes.insert(key.to_owned(), value.to_owned());
    }
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

impl From<&Device> for Object {
    fn from(device: &Device) -> Self {
        let mut attributes = device.attributes.clone();
        set_attribute(&mut attributes, ATTR_TYPE, &device.device_type);
        set_attribute(&mut attributes, ATTR_ROLE, &device.role);
        set_attribute(&mut attributes, ATTR_ADDRESS, &device.address);
        set_attribute(&mut attributes, ATTR_TARGET, &device.target);
        set_attribute(&mut attributes, ATTR_VERSION, device.version.as_str());
        set_attribute(&mut attributes, ATTR_DISPLAY_NAME, &device.display_name);
        attributes.insert(ATTR_TLS_PLAIN.to_owned(), flag(device.tls.plain).to_owned());
        attributes.insert(
            ATTR_TLS_INSECURE.to_owned(),
            flag(device.tls.insecure).to_owned(),
        );
        set_attribute(&mut attributes, ATTR_TLS_KEY, &device.tls.key);
        set_attribute(&mut attributes, ATTR_TLS_CA_CERT, &device.tls.ca_cert);
        set_attribute(&mut attributes, ATTR_TLS_CERT, &device.tls.cert);

        Object {
            id: device.id.to_string(),
            kind: device.device_type.clone(),
            attributes,
            protocols: device.protocols.clone(),
            revision: device.revision,
        }
    }
}

impl TryFrom<&Object> for Device {
    type Error = TopologyError;

    fn try_from(object: &Object) -> Result<Device, TopologyError> {
        let attr = |key: &str| object.attributes.get(key).cloned().unwrap_or_default();

        let version = object.attributes.get(ATTR_VERSION).ok_or_else(|| {
            TopologyError::InvalidObject(format!(
                "topology entity {} must have a '{ATTR_VERSION}' attribute",
                object.id
            ))
        })?;
        let address = object.attributes.get(ATTR_ADDRESS).ok_or_else(|| {
            TopologyError::InvalidObject(format!(
                "topology entity {} must have an '{ATTR_ADDRESS}' attribute",
                object.id
            ))
        })?;
        if object.kind.is_empty() {
            return Err(TopologyError::InvalidObject(format!(
                "topology entity {} must have a kind",
                object.id
            )));
        }

        Ok(Device {
            id: DeviceId::new(&object.id),
            address: address.clone(),
            target: attr(ATTR_TARGET),
            version: DeviceVersion::new(version),
            timeout: None,
            // Credentials are provisioned out of band, never through the
            // topology object.
            credentials: Credentials::default(),
            tls: TlsConfig {
                ca_cert: attr(ATTR_TLS_CA_CERT),
                cert: attr(ATTR_TLS_CERT),
                key: attr(ATTR_TLS_KEY),
                plain: attr(ATTR_TLS_PLAIN) == "true",
                insecure: attr(ATTR_TLS_INSECURE) == "true",
            },
            device_type: object.kind.clone(),
            role: attr(ATTR_ROLE),
            protocols: object.protocols.clone(),
            display_name: attr(ATTR_DISPLAY_NAME),
            attributes: object.attributes.clone(),
            revision: object.revision,
        })
    }
}
