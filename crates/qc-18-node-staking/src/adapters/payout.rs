//! Static payout-address routing table.

use crate::domain::{Address, Collaborator, StakingError, StakingResult};
use crate::ports::PayoutResolver;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Resolver backed by an explicit node → payout map.
#[derive(Default)]
pub struct StaticPayoutResolver {
    routes: RwLock<HashMap<Address, Address>>,
    failing: AtomicBool,
}

impl StaticPayoutResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_route(&self, node: Address, payout: Address) {
        self.routes.write().insert(node, payout);
    }

    pub fn clear_route(&self, node: &Address) {
        self.routes.write().remove(node);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PayoutResolver for StaticPayoutResolver {
    async fn payout_address_for(&self, node: &Address) -> StakingResult<Option<Address>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StakingError::custody(
                Collaborator::PayoutResolver,
                "resolver unavailable",
            ));
        }
        Ok(self.routes.read().get(node).copied())
    }
}
