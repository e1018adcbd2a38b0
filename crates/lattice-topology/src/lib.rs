//! Device topology for Lattice
//!
//! This crate provides:
//! - The device entity ([`Device`]) and its credentials/TLS configuration
//! - Conversion between devices and generic topology objects ([`Object`])
//! - Capability traits for the device registry and the device cache

pub mod device;
pub mod error;
pub mod object;
pub mod registry;

pub use device::{ConnectivityState, Credentials, Device, ProtocolState, TlsConfig};
pub use error::TopologyError;
pub use object::Object;
pub use registry::{DeviceCache, DeviceRegistry};
