//! Error types for topology operations

use thiserror::Error;

/// Topology-related errors
#[derive(Debug, Clone, Error)]
pub enum TopologyError {
    /// The requested device is not known to the registry
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A topology object could not be interpreted as a device
    #[error("invalid topology object: {0}")]
    InvalidObject(String),

    /// Failure talking to the backing topology service
    #[error("topology service error: {0}")]
    Service(String),
}
