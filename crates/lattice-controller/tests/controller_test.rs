//! Scheduling behavior of the controller framework

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use lattice_controller::{
    Controller, ControllerBuilder, ControllerError, Filter, Outcome, PartitionKey, Partitioner,
    Reconciler, Watcher,
};

/// Watcher fed directly from a test channel.
struct ChannelWatcher {
    receiver: Mutex<Option<mpsc::Receiver<String>>>,
}

impl ChannelWatcher {
    fn new() -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(256);
        (
            tx,
            ChannelWatcher {
                receiver: Mutex::new(Some(rx)),
            },
        )
    }
}

#[async_trait]
impl Watcher for ChannelWatcher {
    type Id = String;

    async fn start(
        &self,
        queue: mpsc::Sender<String>,
        token: CancellationToken,
    ) -> Result<(), ControllerError> {
        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| ControllerError::Watch("watcher already started".to_owned()))?;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    item = receiver.recv() => match item {
                        Some(item) => {
                            if queue.send(item).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
        });
        Ok(())
    }
}

struct SinglePartition;

impl Partitioner for SinglePartition {
    type Id = String;

    fn partition(&self, _id: &String) -> PartitionKey {
        PartitionKey::new("all")
    }
}

struct PartitionPerId;

impl Partitioner for PartitionPerId {
    type Id = String;

    fn partition(&self, id: &String) -> PartitionKey {
        PartitionKey::new(id.clone())
    }
}

/// Counts steps and blocks each one on a semaphore permit.
struct GatedReconciler {
    steps: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl Reconciler for GatedReconciler {
    type Id = String;

    async fn reconcile(&self, _id: String) -> Result<Outcome, ControllerError> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(Outcome::Done)
    }
}

struct AlwaysRetry {
    steps: Arc<AtomicUsize>,
}

#[async_trait]
impl Reconciler for AlwaysRetry {
    type Id = String;

    async fn reconcile(&self, _id: String) -> Result<Outcome, ControllerError> {
        self.steps.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::Retry)
    }
}

struct Overlapping {
    current: Arc<AtomicUsize>,
    max: Arc<AtomicUsize>,
}

#[async_trait]
impl Reconciler for Overlapping {
    type Id = String;

    async fn reconcile(&self, _id: String) -> Result<Outcome, ControllerError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(Outcome::Done)
    }
}

struct RejectAll;

#[async_trait]
impl Filter for RejectAll {
    type Id = String;

    async fn accept(&self, _id: &String) -> bool {
        false
    }
}

struct ToggleFilter {
    allow: Arc<AtomicBool>,
}

#[async_trait]
impl Filter for ToggleFilter {
    type Id = String;

    async fn accept(&self, _id: &String) -> bool {
        self.allow.load(Ordering::SeqCst)
    }
}

async fn wait_for(steps: &AtomicUsize, expected: usize) {
    for _ in 0..100 {
        if steps.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "timed out waiting for {expected} steps, saw {}",
        steps.load(Ordering::SeqCst)
    );
}

// Ten events for an ID arriving while a step is in flight collapse into at
// most one follow-up step.
#[tokio::test]
async fn events_for_one_id_coalesce() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("lattice_controller=debug")
        .try_init();

    let steps = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(0));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("coalesce-test")
        .watch(watcher)
        .partition(PartitionPerId)
        .reconcile(GatedReconciler {
            steps: steps.clone(),
            gate: gate.clone(),
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    tx.send("change-1".to_owned()).await.unwrap();
    wait_for(&steps, 1).await;

    for _ in 0..10 {
        tx.send("change-1".to_owned()).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    gate.add_permits(100);
    tokio::time::sleep(Duration::from_millis(200)).await;

    let total = steps.load(Ordering::SeqCst);
    assert!(
        (2..=3).contains(&total),
        "expected the ten extra events to coalesce, saw {total} steps"
    );

    controller.stop().await;
}

// A step that keeps asking for a retry is re-run with doubling backoff and
// dropped after the cap: one initial attempt plus five retries.
#[tokio::test]
async fn retries_are_capped() {
    let steps = Arc::new(AtomicUsize::new(0));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("retry-test")
        .watch(watcher)
        .partition(SinglePartition)
        .reconcile(AlwaysRetry {
            steps: steps.clone(),
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    tx.send("change-1".to_owned()).await.unwrap();
    // Backoffs total 620 ms; leave generous headroom.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(steps.load(Ordering::SeqCst), 6);

    // The item was dropped, not rescheduled.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(steps.load(Ordering::SeqCst), 6);

    controller.stop().await;
}

// Steps within one partition never overlap.
#[tokio::test]
async fn one_partition_is_serial() {
    let current = Arc::new(AtomicUsize::new(0));
    let max = Arc::new(AtomicUsize::new(0));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("serial-test")
        .watch(watcher)
        .partition(SinglePartition)
        .reconcile(Overlapping {
            current: current.clone(),
            max: max.clone(),
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    for id in ["change-1", "change-2", "change-3"] {
        tx.send(id.to_owned()).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(max.load(Ordering::SeqCst), 1);

    controller.stop().await;
}

// Separate partitions reconcile in parallel.
#[tokio::test]
async fn partitions_run_in_parallel() {
    let current = Arc::new(AtomicUsize::new(0));
    let max = Arc::new(AtomicUsize::new(0));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("parallel-test")
        .watch(watcher)
        .partition(PartitionPerId)
        .reconcile(Overlapping {
            current: current.clone(),
            max: max.clone(),
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    tx.send("device-1".to_owned()).await.unwrap();
    tx.send("device-2".to_owned()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(max.load(Ordering::SeqCst) >= 2);

    controller.stop().await;
}

// A rejecting filter drops events before they reach the reconciler.
#[tokio::test]
async fn filtered_events_are_dropped() {
    let steps = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(100));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("filter-test")
        .watch(watcher)
        .filter(RejectAll)
        .partition(SinglePartition)
        .reconcile(GatedReconciler {
            steps: steps.clone(),
            gate,
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    tx.send("change-1".to_owned()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(steps.load(Ordering::SeqCst), 0);

    controller.stop().await;
}

// Filters are consulted when an item is dequeued, not when it is enqueued:
// an item queued while acceptable is still dropped if the filter's answer
// has changed by the time its step would run.
#[tokio::test]
async fn filters_run_immediately_before_each_step() {
    let steps = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(0));
    let allow = Arc::new(AtomicBool::new(true));
    let (tx, watcher) = ChannelWatcher::new();

    let controller: Controller<String> = ControllerBuilder::new("step-filter-test")
        .watch(watcher)
        .filter(ToggleFilter {
            allow: allow.clone(),
        })
        .partition(PartitionPerId)
        .reconcile(GatedReconciler {
            steps: steps.clone(),
            gate: gate.clone(),
        })
        .build()
        .unwrap();
    controller.start().await.unwrap();

    tx.send("change-1".to_owned()).await.unwrap();
    wait_for(&steps, 1).await;

    // A second occurrence is queued while the first step is in flight, then
    // the filter's answer flips before the worker reaches it.
    tx.send("change-1".to_owned()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    allow.store(false, Ordering::SeqCst);
    gate.add_permits(100);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(steps.load(Ordering::SeqCst), 1);

    controller.stop().await;
}

#[tokio::test]
async fn double_start_is_rejected() {
    let (_tx, watcher) = ChannelWatcher::new();
    let controller: Controller<String> = ControllerBuilder::new("lifecycle-test")
        .watch(watcher)
        .partition(SinglePartition)
        .reconcile(AlwaysRetry {
            steps: Arc::new(AtomicUsize::new(0)),
        })
        .build()
        .unwrap();

    controller.start().await.unwrap();
    assert!(matches!(
        controller.start().await,
        Err(ControllerError::AlreadyStarted)
    ));
    controller.stop().await;
}
