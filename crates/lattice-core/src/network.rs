//! Network-level change objects

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceChangeId, DeviceChangeSpec};
use crate::status::Status;
use crate::types::Revision;

/// Identifier of a network change
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkChangeId(String);

impl NetworkChangeId {
    pub fn new(id: impl Into<String>) -> Self {
        NetworkChangeId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NetworkChangeId {
    fn from(id: &str) -> Self {
        NetworkChangeId(id.to_owned())
    }
}

/// Reference from a network change to one of its device change rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceChangeRef {
    pub device_change_id: DeviceChangeId,
}

/// Operator-visible intent: an ordered, non-empty set of per-device changes
/// applied together.
///
/// `refs` starts empty and is populated by the network-change controller once
/// the child rows exist; its presence is how a reconcile step distinguishes
/// "children not yet created" from "children in flight".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkChange {
    pub id: NetworkChangeId,
    pub changes: Vec<DeviceChangeSpec>,
    pub refs: Vec<DeviceChangeRef>,
    pub status: Status,
    pub revision: Revision,
}

impl NetworkChange {
    /// A new, unissued network change.
    pub fn new(id: impl Into<NetworkChangeId>, changes: Vec<DeviceChangeSpec>) -> Self {
        NetworkChange {
            id: id.into(),
            changes,
            refs: Vec::new(),
            status: Status::initial(),
            revision: Revision::default(),
        }
    }
}
