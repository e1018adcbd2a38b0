//! Controller assembly and scheduling

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::filter::Filter;
use crate::partition::{PartitionKey, Partitioner};
use crate::reconciler::{Outcome, Reconciler, WorkId};
use crate::watcher::Watcher;

/// Assembles a [`Controller`] from its parts.
pub struct ControllerBuilder<I: WorkId> {
    name: String,
    config: ControllerConfig,
    watchers: Vec<Arc<dyn Watcher<Id = I>>>,
    filters: Vec<Arc<dyn Filter<Id = I>>>,
    partitioner: Option<Arc<dyn Partitioner<Id = I>>>,
    reconciler: Option<Arc<dyn Reconciler<Id = I>>>,
}

impl<I: WorkId> ControllerBuilder<I> {
    pub fn new(name: impl Into<String>) -> Self {
        ControllerBuilder {
            name: name.into(),
            config: ControllerConfig::default(),
            watchers: Vec::new(),
            filters: Vec::new(),
            partitioner: None,
            reconciler: None,
        }
    }

    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a source of work item IDs. At least one is required.
    pub fn watch(mut self, watcher: impl Watcher<Id = I>) -> Self {
        self.watchers.push(Arc::new(watcher));
        self
    }

    /// Adds a dispatch-time gate. All filters must accept an ID for it to be
    /// scheduled.
    pub fn filter(mut self, filter: impl Filter<Id = I>) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn partition(mut self, partitioner: impl Partitioner<Id = I>) -> Self {
        self.partitioner = Some(Arc::new(partitioner));
        self
    }

    pub fn reconcile(mut self, reconciler: impl Reconciler<Id = I>) -> Self {
        self.reconciler = Some(Arc::new(reconciler));
        self
    }

    pub fn build(self) -> Result<Controller<I>, ControllerError> {
        if self.watchers.is_empty() {
            return Err(ControllerError::Misconfigured(format!(
                "controller {} has no watchers",
                self.name
            )));
        }
        let partitioner = self.partitioner.ok_or_else(|| {
            ControllerError::Misconfigured(format!("controller {} has no partitioner", self.name))
        })?;
        let reconciler = self.reconciler.ok_or_else(|| {
            ControllerError::Misconfigured(format!("controller {} has no reconciler", self.name))
        })?;
        Ok(Controller {
            name: self.name,
            config: self.config,
            watchers: self.watchers,
            filters: self.filters,
            partitioner,
            reconciler,
            runtime: Mutex::new(None),
        })
    }
}

struct Runtime {
    token: CancellationToken,
    dispatcher: JoinHandle<()>,
}

/// An assembled controller. `start` wires the watchers into the dispatcher;
/// `stop` cancels everything and waits for the dispatcher to exit.
pub struct Controller<I: WorkId> {
    name: String,
    config: ControllerConfig,
    watchers: Vec<Arc<dyn Watcher<Id = I>>>,
    filters: Vec<Arc<dyn Filter<Id = I>>>,
    partitioner: Arc<dyn Partitioner<Id = I>>,
    reconciler: Arc<dyn Reconciler<Id = I>>,
    runtime: Mutex<Option<Runtime>>,
}

impl<I: WorkId> Controller<I> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn start(&self) -> Result<(), ControllerError> {
        let mut runtime = self.runtime.lock().await;
        if runtime.is_some() {
            return Err(ControllerError::AlreadyStarted);
        }

        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(self.config.dispatch_depth);
        for watcher in &self.watchers {
            watcher.start(tx.clone(), token.child_token()).await?;
        }
        drop(tx);

        let dispatcher = tokio::spawn(dispatch(
            self.name.clone(),
            self.config.clone(),
            rx,
            self.filters.clone(),
            self.partitioner.clone(),
            self.reconciler.clone(),
            token.child_token(),
        ));
        *runtime = Some(Runtime { token, dispatcher });
        info!(controller = %self.name, "started");
        Ok(())
    }

    pub async fn stop(&self) {
        let runtime = self.runtime.lock().await.take();
        if let Some(runtime) = runtime {
            runtime.token.cancel();
            let _ = runtime.dispatcher.await;
            info!(controller = %self.name, "stopped");
        }
    }
}

struct Partition<I> {
    tx: mpsc::Sender<I>,
    /// IDs queued but not yet dequeued by the worker; duplicates coalesce.
    pending: Arc<StdMutex<HashSet<I>>>,
}

#[allow(clippy::too_many_arguments)]
async fn dispatch<I: WorkId>(
    name: String,
    config: ControllerConfig,
    mut rx: mpsc::Receiver<I>,
    filters: Vec<Arc<dyn Filter<Id = I>>>,
    partitioner: Arc<dyn Partitioner<Id = I>>,
    reconciler: Arc<dyn Reconciler<Id = I>>,
    token: CancellationToken,
) {
    let mut partitions: HashMap<PartitionKey, Partition<I>> = HashMap::new();

    loop {
        let id = tokio::select! {
            _ = token.cancelled() => break,
            id = rx.recv() => match id {
                Some(id) => id,
                None => break,
            },
        };

        let key = partitioner.partition(&id);
        let partition = partitions.entry(key.clone()).or_insert_with(|| {
            spawn_partition(
                name.clone(),
                key,
                config.clone(),
                filters.clone(),
                reconciler.clone(),
                token.child_token(),
            )
        });

        {
            let mut pending = partition
                .pending
                .lock()
                .expect("partition pending set poisoned");
            if !pending.insert(id.clone()) {
                // Already queued; the pending step will read the latest state.
                continue;
            }
        }
        if partition.tx.send(id).await.is_err() {
            break;
        }
    }
}

/// All filters must accept the ID for a step to run.
async fn accept_all<I: WorkId>(filters: &[Arc<dyn Filter<Id = I>>], id: &I) -> bool {
    for filter in filters {
        if !filter.accept(id).await {
            return false;
        }
    }
    true
}

fn spawn_partition<I: WorkId>(
    name: String,
    key: PartitionKey,
    config: ControllerConfig,
    filters: Vec<Arc<dyn Filter<Id = I>>>,
    reconciler: Arc<dyn Reconciler<Id = I>>,
    token: CancellationToken,
) -> Partition<I> {
    let (tx, mut rx) = mpsc::channel(config.partition_depth);
    let pending = Arc::new(StdMutex::new(HashSet::new()));
    let dequeued = pending.clone();

    tokio::spawn(async move {
        loop {
            let id: I = tokio::select! {
                _ = token.cancelled() => break,
                id = rx.recv() => match id {
                    Some(id) => id,
                    None => break,
                },
            };
            dequeued
                .lock()
                .expect("partition pending set poisoned")
                .remove(&id);

            // Step gate: filters see the latest store state, at the
            // partition's serialization point.
            if !accept_all(&filters, &id).await {
                debug!(controller = %name, partition = %key, ?id, "item filtered");
                continue;
            }

            let mut attempt = 0u32;
            loop {
                match reconciler.reconcile(id.clone()).await {
                    Ok(Outcome::Done) => break,
                    Ok(Outcome::Retry) => {
                        debug!(controller = %name, partition = %key, ?id, attempt, "step retried");
                    }
                    Err(err) => {
                        warn!(controller = %name, partition = %key, ?id, attempt, %err, "step failed");
                    }
                }
                if attempt >= config.max_retries {
                    warn!(controller = %name, partition = %key, ?id, "retries exhausted, dropping");
                    break;
                }
                let delay = config.backoff_base * 2u32.pow(attempt);
                attempt += 1;
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    });

    Partition { tx, pending }
}
