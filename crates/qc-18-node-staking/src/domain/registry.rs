//! # Participant Registry
//!
//! Set of nodes currently participating (status other than `Unstaked`).

use super::value_objects::Address;
use std::collections::HashSet;

/// Membership set of participating nodes. Enumeration order is not meaningful.
#[derive(Clone, Debug, Default)]
pub struct NodeRegistry {
    members: HashSet<Address>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, node: &Address) -> bool {
        self.members.contains(node)
    }

    /// Returns false if the node was already registered.
    pub fn insert(&mut self, node: Address) -> bool {
        self.members.insert(node)
    }

    /// Returns false if the node was not registered.
    pub fn remove(&mut self, node: &Address) -> bool {
        self.members.remove(node)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    /// Snapshot of all members.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Address> {
        self.members.iter().copied().collect()
    }
}
