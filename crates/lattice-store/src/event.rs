//! Watch stream types

use tokio::sync::mpsc;

/// What happened to the object carried by a [`WatchEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Updated,
    Removed,
}

/// One store event: the kind of write and the object state after it.
#[derive(Debug, Clone)]
pub struct WatchEvent<T> {
    pub kind: EventKind,
    pub object: T,
}

/// Options for registering a watch.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Emit one `Created` event per currently persisted object before any
    /// live events.
    pub replay: bool,
}

impl WatchOptions {
    /// Watch with replay of the current store contents.
    pub fn replay() -> Self {
        WatchOptions { replay: true }
    }
}

/// Receiving side of a store watch.
///
/// Dropping the handle releases the watch; the store prunes the registration
/// on its next write.
#[derive(Debug)]
pub struct WatchHandle<T> {
    receiver: mpsc::Receiver<WatchEvent<T>>,
}

impl<T> WatchHandle<T> {
    pub fn new(receiver: mpsc::Receiver<WatchEvent<T>>) -> Self {
        WatchHandle { receiver }
    }

    /// The next event, or `None` once the store side has gone away.
    pub async fn recv(&mut self) -> Option<WatchEvent<T>> {
        self.receiver.recv().await
    }

    /// Releases the watch.
    pub fn close(self) {}
}
