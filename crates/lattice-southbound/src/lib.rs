//! Device session layer for Lattice
//!
//! The device-change controller talks to devices through the [`DeviceTarget`]
//! session trait. Sessions are created lazily through an injected
//! [`Connector`] and cached in the [`SessionRegistry`], at most one per
//! device, with creation serialized per device.

pub mod error;
pub mod message;
pub mod registry;
pub mod target;

pub use error::{Code, WireError};
pub use message::{PathUpdate, SetRequest, SetResponse};
pub use registry::{Connector, SessionRegistry};
pub use target::DeviceTarget;
