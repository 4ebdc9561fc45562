//! Snapshot registry of connected nodes and the diff between two snapshots

use std::collections::{BTreeSet, HashMap};

use tracing::warn;

use crate::node::NodeRecord;

/// An immutable snapshot of connected nodes, indexed by key
///
/// Built once per poll cycle. Duplicate keys resolve last-writer-wins; a
/// duplicate is a bug in the poll source and is only logged here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRegistry {
    records: Vec<NodeRecord>,
    index: HashMap<String, NodeRecord>,
}

/// Key-set difference between two successive snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDiff {
    /// Keys present now that were absent before
    pub added: BTreeSet<String>,

    /// Keys present before that are absent now
    pub removed: BTreeSet<String>,

    /// Whether the number of records in the snapshot changed
    pub count_changed: bool,
}

impl NodeRegistry {
    /// Build a registry from one snapshot
    pub fn build(records: Vec<NodeRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());

        for record in &records {
            if index.insert(record.key.clone(), record.clone()).is_some() {
                warn!(key = %record.key, "duplicate node key in snapshot, keeping last record");
            }
        }

        Self { records, index }
    }

    /// Number of records in the snapshot, duplicates included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct node keys
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    pub fn get(&self, key: &str) -> Option<&NodeRecord> {
        self.index.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Records in snapshot order
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.records.iter()
    }

    /// Distinct node keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Compare `previous` against `current`
    pub fn diff(previous: &NodeRegistry, current: &NodeRegistry) -> RegistryDiff {
        let added = current
            .index
            .keys()
            .filter(|key| !previous.contains(key))
            .cloned()
            .collect();

        let removed = previous
            .index
            .keys()
            .filter(|key| !current.contains(key))
            .cloned()
            .collect();

        RegistryDiff {
            added,
            removed,
            count_changed: current.len() != previous.len(),
        }
    }
}

impl FromIterator<NodeRecord> for NodeRegistry {
    fn from_iter<T: IntoIterator<Item = NodeRecord>>(iter: T) -> Self {
        NodeRegistry::build(iter.into_iter().collect())
    }
}

impl RegistryDiff {
    /// Nothing was added or removed and the record count is unchanged
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && !self.count_changed
    }

    /// Render the status text published for this change
    ///
    /// Keys are listed in lexicographic order, followed by the new total.
    pub fn report(&self, total: usize) -> String {
        let mut lines = Vec::with_capacity(self.added.len() + self.removed.len() + 1);

        for key in &self.added {
            lines.push(format!("**Node connected:** `{key}`"));
        }

        for key in &self.removed {
            lines.push(format!("**Node disconnected:** `{key}`"));
        }

        lines.push(format!("Connected nodes: {total}"));
        lines.join("\n")
    }
}
