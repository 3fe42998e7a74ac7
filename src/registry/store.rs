//! Registry Storage

use std::collections::BTreeMap;

use super::errors::{CoherenceError, CoherenceResult};
use crate::model::{ConsistencyState, ReplicaKey, ReplicaRecord};

/// Mapping from replica key to replica record.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: BTreeMap<ReplicaKey, ReplicaRecord>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from seeded records.
    ///
    /// Later records with a duplicate key replace earlier ones; bootstrap
    /// validation rejects duplicates before this point.
    pub fn from_records(records: impl IntoIterator<Item = ReplicaRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.insert(record);
        }
        registry
    }

    /// Seed a record, returning the one it replaced.
    pub fn insert(&mut self, record: ReplicaRecord) -> Option<ReplicaRecord> {
        self.records.insert(record.key().clone(), record)
    }

    /// Look up a record.
    pub fn get(&self, key: &ReplicaKey) -> CoherenceResult<&ReplicaRecord> {
        self.records
            .get(key)
            .ok_or_else(|| CoherenceError::UnknownReplica(key.clone()))
    }

    pub(crate) fn get_mut(&mut self, key: &ReplicaKey) -> CoherenceResult<&mut ReplicaRecord> {
        self.records
            .get_mut(key)
            .ok_or_else(|| CoherenceError::UnknownReplica(key.clone()))
    }

    pub fn contains(&self, key: &ReplicaKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ReplicaRecord> {
        self.records.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ReplicaRecord> {
        self.records.values_mut()
    }

    /// Every replica of a logical component, in key order.
    pub fn replicas_of<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a ReplicaRecord> {
        self.records
            .values()
            .filter(move |record| record.component() == component)
    }

    /// Keys of every other replica of the same component, in key order.
    pub fn siblings(&self, key: &ReplicaKey) -> Vec<ReplicaKey> {
        self.records
            .keys()
            .filter(|candidate| candidate.is_sibling_of(key))
            .cloned()
            .collect()
    }

    /// Replicas of `component` currently in Modified.
    ///
    /// The transition rules do not structurally prevent two concurrent
    /// writers, so callers must not assume this has at most one entry.
    pub fn writers(&self, component: &str) -> Vec<&ReplicaKey> {
        self.records
            .values()
            .filter(|record| {
                record.component() == component && record.state() == ConsistencyState::Modified
            })
            .map(|record| record.key())
            .collect()
    }

    /// Distinct component names, sorted.
    pub fn components(&self) -> Vec<String> {
        let mut components: Vec<String> = self
            .records
            .keys()
            .map(|key| key.component.clone())
            .collect();
        components.sort();
        components.dedup();
        components
    }
}
