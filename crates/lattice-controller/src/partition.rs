//! Partitioner trait

use std::fmt;

use crate::reconciler::WorkId;

/// Key of a work partition. Reconcile steps are strictly serial within one
/// partition and independent across partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn new(key: impl Into<String>) -> Self {
        PartitionKey(key.into())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pure mapping of a work item to its partition.
pub trait Partitioner: Send + Sync + 'static {
    type Id: WorkId;

    fn partition(&self, id: &Self::Id) -> PartitionKey;
}
