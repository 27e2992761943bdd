//! # Staking Record Store
//!
//! Exclusive owner of record lifecycle. Records are read out as owned copies
//! and written back whole, so an operation stages its changes on a copy and
//! only touches the store at commit.

use super::entities::StakingRecord;
use super::value_objects::Address;
use std::collections::HashMap;

/// Map from node to its staking record.
#[derive(Clone, Debug, Default)]
pub struct StakingStore {
    records: HashMap<Address, StakingRecord>,
}

impl StakingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &Address) -> Option<&StakingRecord> {
        self.records.get(node)
    }

    /// Copy of the stored record, or a fresh zero-valued record for a node
    /// that has never staked. The fresh record is not inserted.
    #[must_use]
    pub fn get_or_create(&self, node: &Address) -> StakingRecord {
        self.records
            .get(node)
            .cloned()
            .unwrap_or_else(|| StakingRecord::new(*node))
    }

    /// Insert or overwrite the record keyed by `record.node`.
    pub fn put(&mut self, record: StakingRecord) {
        self.records.insert(record.node, record);
    }

    /// Destroy a record.
    pub fn remove(&mut self, node: &Address) -> Option<StakingRecord> {
        self.records.remove(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &StakingRecord> {
        self.records.values()
    }
}
