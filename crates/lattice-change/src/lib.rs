//! Change reconciliation controllers
//!
//! Two controllers cooperate to drive a [`lattice_core::NetworkChange`] and
//! its per-device [`lattice_core::DeviceChange`] rows to a consistent end
//! state:
//!
//! - the **network-change controller** ([`network`]) owns the parent: it
//!   creates the device change rows, issues and re-issues incarnations, and
//!   aggregates the children's states into the parent's status. Only the
//!   cluster leader acts.
//! - the **device-change controller** ([`device`]) owns the device-facing
//!   side: it translates a pending row into one `Set` request, sends it, and
//!   records the outcome. Only the master of the row's device acts.
//!
//! The controllers never talk to each other directly. All coordination goes
//! through the stores: each level watches the other's objects and reacts to
//! the writes it observes, with the status incarnation as the
//! synchronization scalar.

pub mod device;
pub mod network;
