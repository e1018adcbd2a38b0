//! Shared fixtures for the controller integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use lattice_change::{device, network};
use lattice_controller::Controller;
use lattice_core::{
    ChangeOp, DeviceChangeId, DeviceChangeSpec, NetworkChangeId, Path, Phase, Reason, State,
    Status, TypedValue,
};
use lattice_southbound::{
    Code, Connector, DeviceTarget, SessionRegistry, SetRequest, SetResponse, WireError,
};
use lattice_store::{NetworkChangeStore, StoreError, WatchEvent, WatchHandle};
use lattice_store_memory::{
    LocalLeadershipStore, LocalMastershipStore, MemoryDeviceChangeStore, MemoryNetworkChangeStore,
};
use lattice_topology::Device;
use lattice_topology_mock::{MockDeviceCache, MockDeviceRegistry};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("lattice_change=debug,lattice_controller=info")
        .try_init();
}

pub fn device1() -> Device {
    Device::new("device-1", "device-1:11161", "1.0.0")
}

pub fn device2() -> Device {
    Device::new("device-2", "device-2:11161", "1.0.0")
}

/// The per-device portions of the test network change.
pub fn device_change1() -> DeviceChangeSpec {
    DeviceChangeSpec::new(
        "device-1",
        "1.0.0",
        vec![ChangeOp::Create {
            path: Path::root("foo"),
            value: TypedValue::string("Hello world!"),
        }],
    )
}

pub fn device_change2() -> DeviceChangeSpec {
    DeviceChangeSpec::new(
        "device-2",
        "1.0.0",
        vec![ChangeOp::Create {
            path: Path::root("baz"),
            value: TypedValue::string("Goodbye world!"),
        }],
    )
}

enum Reply {
    Ok,
    Error { code: Code, prefix: String },
}

/// Scripted device target. Replies are consumed in order; a device with an
/// exhausted script accepts further requests, which the per-test call-count
/// assertions then catch.
pub struct MockTarget {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<SetRequest>>,
    token: CancellationToken,
}

impl MockTarget {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTarget {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            token: CancellationToken::new(),
        })
    }

    /// Queues `times` successful replies.
    pub fn reply_ok(&self, times: usize) {
        let mut replies = self.replies.lock().unwrap();
        for _ in 0..times {
            replies.push_back(Reply::Ok);
        }
    }

    /// Queues one rejection whose description embeds the received request,
    /// the way devices echo the offending payload.
    pub fn reply_error(&self, code: Code, prefix: &str) {
        self.replies.lock().unwrap().push_back(Reply::Error {
            code,
            prefix: prefix.to_owned(),
        });
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<SetRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceTarget for MockTarget {
    async fn set(&self, request: SetRequest) -> Result<SetResponse, WireError> {
        let reply = self.replies.lock().unwrap().pop_front();
        let result = match reply {
            Some(Reply::Error { code, prefix }) => {
                Err(WireError::new(code, format!("{prefix} {request}")))
            }
            Some(Reply::Ok) | None => Ok(SetResponse::default()),
        };
        self.calls.lock().unwrap().push(request);
        result
    }

    fn context(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Connector for tests that pre-register every session; dialing is a bug.
pub struct RefusingConnector;

#[async_trait]
impl Connector for RefusingConnector {
    async fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceTarget>, WireError> {
        Err(WireError::unavailable(format!(
            "no dialer configured for {}",
            device.id
        )))
    }
}

/// Both controllers wired against in-memory stores.
pub struct Harness {
    pub network_changes: Arc<MemoryNetworkChangeStore>,
    pub device_changes: Arc<MemoryDeviceChangeStore>,
    pub devices: Arc<MockDeviceRegistry>,
    pub cache: Arc<MockDeviceCache>,
    pub leadership: Arc<LocalLeadershipStore>,
    pub mastership: Arc<LocalMastershipStore>,
    pub sessions: Arc<SessionRegistry>,
    pub network_controller: Controller<NetworkChangeId>,
    pub device_controller: Controller<DeviceChangeId>,
}

impl Harness {
    pub fn new() -> Self {
        let network_changes = Arc::new(MemoryNetworkChangeStore::new());
        let device_changes = Arc::new(MemoryDeviceChangeStore::new());
        let devices = Arc::new(MockDeviceRegistry::new());
        let cache = Arc::new(MockDeviceCache::new());
        let leadership = Arc::new(LocalLeadershipStore::new());
        let mastership = Arc::new(LocalMastershipStore::new());
        let sessions = Arc::new(SessionRegistry::new(Arc::new(RefusingConnector)));

        let network_controller = network::new_controller(
            leadership.clone(),
            cache.clone(),
            network_changes.clone(),
            device_changes.clone(),
        )
        .expect("network controller");
        let device_controller = device::new_controller(
            mastership.clone(),
            devices.clone(),
            cache.clone(),
            device_changes.clone(),
            sessions.clone(),
        )
        .expect("device controller");

        Harness {
            network_changes,
            device_changes,
            devices,
            cache,
            leadership,
            mastership,
            sessions,
            network_controller,
            device_controller,
        }
    }

    /// Registers a device, optionally marking it reachable in the cache.
    pub async fn add_device(&self, device: Device, cached: bool) {
        if cached {
            self.cache
                .insert(device.id.clone(), device.version.clone())
                .await;
        }
        self.devices.add(device).await;
    }

    pub async fn register_target(&self, device: &Device, target: Arc<MockTarget>) {
        self.sessions
            .register(device.id.clone(), device.version.clone(), target)
            .await;
    }

    pub async fn start(&self) {
        self.network_controller.start().await.expect("start ncc");
        self.device_controller.start().await.expect("start dcc");
    }

    pub async fn stop(&self) {
        self.network_controller.stop().await;
        self.device_controller.stop().await;
    }
}

/// The next event on a watch, failing the test after 500 ms.
pub async fn next_event<T: Debug>(watch: &mut WatchHandle<T>) -> WatchEvent<T> {
    tokio::time::timeout(Duration::from_millis(500), watch.recv())
        .await
        .expect("timed out waiting for event")
        .expect("watch closed")
}

/// Asserts that nothing further arrives on a watch.
pub async fn expect_no_event<T: Debug>(watch: &mut WatchHandle<T>) {
    if let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(100), watch.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}

/// Asserts the full status tuple in one call.
pub fn assert_status(
    status: &Status,
    phase: Phase,
    state: State,
    reason: Reason,
    message: &str,
    incarnation: u64,
) {
    assert_eq!(status.phase, phase, "phase of {status:?}");
    assert_eq!(status.state, state, "state of {status:?}");
    assert_eq!(status.reason, reason, "reason of {status:?}");
    assert_eq!(status.message, message, "message of {status:?}");
    assert_eq!(status.incarnation, incarnation, "incarnation of {status:?}");
}

/// Issues an administrative rollback the way the northbound API does: bump
/// the incarnation, flip the phase, and retry on write conflicts with the
/// reconcilers, up to 10 times with 10 ms pauses.
pub async fn request_rollback(store: &Arc<MemoryNetworkChangeStore>, id: &NetworkChangeId) {
    let mut retries = 0;
    loop {
        let mut change = store
            .get(id)
            .await
            .expect("get network change")
            .expect("network change exists");
        change.status.incarnation += 1;
        change.status.phase = Phase::Rollback;
        change.status.state = State::Pending;
        change.status.reason = Reason::None;
        change.status.message = "Administratively requested rollback".to_owned();
        match store.update(&mut change).await {
            Ok(()) => return,
            Err(StoreError::WriteConditionFailed) if retries < 10 => {
                retries += 1;
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Err(err) => panic!("rollback update failed: {err}"),
        }
    }
}

/// Polls the network change until its status satisfies the predicate.
pub async fn await_network_status(
    store: &Arc<MemoryNetworkChangeStore>,
    id: &NetworkChangeId,
    predicate: impl Fn(&Status) -> bool,
) {
    for _ in 0..100 {
        if let Some(change) = store.get(id).await.expect("get network change") {
            if predicate(&change.status) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for network change status");
}

/// Polls the device change store until the row satisfies the predicate.
pub async fn await_device_status(
    store: &Arc<MemoryDeviceChangeStore>,
    id: &DeviceChangeId,
    predicate: impl Fn(&Status) -> bool,
) {
    use lattice_store::DeviceChangeStore;
    for _ in 0..100 {
        if let Some(change) = store.get(id).await.expect("get device change") {
            if predicate(&change.status) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for device change status");
}
