//! Event-driven controller framework
//!
//! A controller turns store events into serialized reconcile steps:
//!
//! ```text
//! store event -> Watcher -> Partitioner -> partition queue
//!                                            -> Filter -> Reconciler step
//! ```
//!
//! Watchers forward object IDs into one dispatch channel. The dispatcher
//! derives a partition key and enqueues into that partition's worker unless
//! the same ID is already queued there (events for one ID coalesce). Each
//! partition runs one worker task, so reconcile steps within a partition are
//! strictly serial while partitions proceed in parallel. Immediately before
//! each step, at the partition's serialization point, the worker evaluates
//! the filters (ownership, terminal-state idempotency) and drops the item if
//! any declines. A step that asks for a retry is re-run with doubling
//! backoff up to a bounded number of attempts, then dropped; a later store
//! event re-triggers it.

pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod partition;
pub mod reconciler;
pub mod watcher;

pub use config::ControllerConfig;
pub use controller::{Controller, ControllerBuilder};
pub use error::ControllerError;
pub use filter::Filter;
pub use partition::{PartitionKey, Partitioner};
pub use reconciler::{Outcome, Reconciler, WorkId};
pub use watcher::Watcher;
