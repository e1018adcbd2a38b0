//! Device session trait

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WireError;
use crate::message::{SetRequest, SetResponse};

/// An open session to one device.
///
/// Production implementations wrap the device's gNMI client; tests script the
/// responses. A session has a lifetime: cancelling [`DeviceTarget::context`]
/// aborts in-flight calls and marks the session unusable, after which the
/// registry reconnects lazily.
#[async_trait]
pub trait DeviceTarget: Send + Sync + 'static {
    /// Applies one typed operation set atomically on the device.
    async fn set(&self, request: SetRequest) -> Result<SetResponse, WireError>;

    /// The session's cancellation handle.
    fn context(&self) -> CancellationToken;
}
