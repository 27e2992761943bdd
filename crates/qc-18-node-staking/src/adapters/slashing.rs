//! Slashing collaborator backed by the in-memory credits ledger.

use super::credits::InMemoryCreditsLedger;
use crate::domain::{Address, Collaborator, StakingError, StakingResult};
use crate::ports::SlashingCollaborator;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Forfeits a slashed node's locked credits and keeps a record of the slash.
pub struct CreditsSlashingAdapter {
    credits: Arc<InMemoryCreditsLedger>,
    slashed: RwLock<Vec<Address>>,
    failing: AtomicBool,
}

impl CreditsSlashingAdapter {
    pub fn new(credits: Arc<InMemoryCreditsLedger>) -> Self {
        Self {
            credits,
            slashed: RwLock::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Nodes slashed so far, in call order.
    #[must_use]
    pub fn slashed(&self) -> Vec<Address> {
        self.slashed.read().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl SlashingCollaborator for CreditsSlashingAdapter {
    async fn slash_participant(&self, node: &Address) -> StakingResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StakingError::custody(
                Collaborator::Slashing,
                "delegated staking unavailable",
            ));
        }

        let forfeited = self.credits.forfeit_locked(node);
        info!("[qc-18] Forfeited {} credits of {}", forfeited, node);
        self.slashed.write().push(*node);
        Ok(())
    }
}
