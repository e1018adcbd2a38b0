//! Change data model for the Lattice network configuration controller
//!
//! This crate defines the two-level change model:
//! - [`NetworkChange`]: operator-visible intent grouping per-device changes
//! - [`DeviceChange`]: one device's portion of a network change
//!
//! Both carry a [`Status`] (phase, state, reason, incarnation) driven by the
//! reconciliation controllers, and an opaque [`Revision`] advanced by the
//! backing store on every write.

pub mod device;
pub mod network;
pub mod status;
pub mod types;
pub mod value;

pub use device::{DeviceChange, DeviceChangeId, DeviceChangeSpec};
pub use network::{DeviceChangeRef, NetworkChange, NetworkChangeId};
pub use status::{Phase, Reason, State, Status};
pub use types::{DeviceId, DeviceVersion, Revision};
pub use value::{ChangeOp, Path, TypedValue};
