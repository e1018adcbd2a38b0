//! Scoped watch behavior of the in-memory device change store

use lattice_core::{
    ChangeOp, DeviceChange, DeviceChangeSpec, DeviceId, DeviceVersion, NetworkChangeId, Path,
    Status, TypedValue,
};
use lattice_store::{DeviceChangeStore, WatchOptions};
use lattice_store_memory::MemoryDeviceChangeStore;

fn device_change(network: &str, device: &str) -> DeviceChange {
    DeviceChange::for_network_change(
        &NetworkChangeId::new(network),
        DeviceChangeSpec::new(
            device,
            "1.0.0",
            vec![ChangeOp::Create {
                path: Path::root("foo"),
                value: TypedValue::string("Hello world!"),
            }],
        ),
        Status::initial(),
    )
}

#[tokio::test]
async fn device_scoped_watch_filters_other_devices() {
    let store = MemoryDeviceChangeStore::new();
    let mut watch = store
        .watch_device(
            &DeviceId::new("device-2"),
            &DeviceVersion::new("1.0.0"),
            WatchOptions::default(),
        )
        .await
        .unwrap();

    store
        .create(&mut device_change("change-1", "device-1"))
        .await
        .unwrap();
    store
        .create(&mut device_change("change-1", "device-2"))
        .await
        .unwrap();

    let event = watch.recv().await.unwrap();
    assert_eq!(event.object.change.device_id, DeviceId::new("device-2"));
}

#[tokio::test]
async fn device_scoped_replay_only_covers_the_device() {
    let store = MemoryDeviceChangeStore::new();
    store
        .create(&mut device_change("change-1", "device-1"))
        .await
        .unwrap();
    store
        .create(&mut device_change("change-1", "device-2"))
        .await
        .unwrap();

    let mut watch = store
        .watch_device(
            &DeviceId::new("device-1"),
            &DeviceVersion::new("1.0.0"),
            WatchOptions::replay(),
        )
        .await
        .unwrap();

    let replayed = watch.recv().await.unwrap();
    assert_eq!(replayed.object.change.device_id, DeviceId::new("device-1"));

    // The other device's row was not replayed; the next event is live.
    store
        .create(&mut device_change("change-2", "device-1"))
        .await
        .unwrap();
    let live = watch.recv().await.unwrap();
    assert_eq!(
        live.object.network_change,
        NetworkChangeId::new("change-2")
    );
}
