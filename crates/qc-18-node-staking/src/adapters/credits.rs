//! In-memory credits accounting service.

use crate::domain::{Address, Amount, Collaborator, StakingError, StakingResult};
use crate::ports::CreditsService;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Credits held for one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreditsAccount {
    /// Free to lock as collateral.
    pub available: Amount,
    /// Currently locked as collateral.
    pub locked: Amount,
}

/// Credits ledger keeping available and locked balances per node.
#[derive(Default)]
pub struct InMemoryCreditsLedger {
    accounts: RwLock<HashMap<Address, CreditsAccount>>,
    forfeited: RwLock<Amount>,
    failing: AtomicBool,
}

impl InMemoryCreditsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `amount` available credits to `node`.
    pub fn deposit(&self, node: Address, amount: Amount) {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(node).or_default();
        account.available = account.available.saturating_add(amount);
    }

    #[must_use]
    pub fn account(&self, node: &Address) -> CreditsAccount {
        self.accounts.read().get(node).copied().unwrap_or_default()
    }

    /// Make every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Zero `node`'s locked credits and return how many were forfeited.
    pub fn forfeit_locked(&self, node: &Address) -> Amount {
        let mut accounts = self.accounts.write();
        let forfeited = accounts
            .get_mut(node)
            .map(|account| std::mem::take(&mut account.locked))
            .unwrap_or_default();

        let mut total = self.forfeited.write();
        *total = total.saturating_add(forfeited);
        forfeited
    }

    /// Credits forfeited through slashing so far.
    #[must_use]
    pub fn total_forfeited(&self) -> Amount {
        *self.forfeited.read()
    }

    fn check_available(&self) -> StakingResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StakingError::custody(
                Collaborator::Credits,
                "credits service unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CreditsService for InMemoryCreditsLedger {
    async fn available_credits(&self, node: &Address) -> StakingResult<Amount> {
        self.check_available()?;
        Ok(self.account(node).available)
    }

    async fn lock_credits(&self, node: &Address, amount: Amount) -> StakingResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write();
        let account = accounts.entry(*node).or_default();
        account.available = account.available.checked_sub(amount).ok_or_else(|| {
            StakingError::custody(
                Collaborator::Credits,
                format!("insufficient available credits for {node}: need {amount}"),
            )
        })?;
        account.locked = account.locked.saturating_add(amount);
        Ok(())
    }

    async fn release_credits(&self, node: &Address, amount: Amount) -> StakingResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write();
        let account = accounts.entry(*node).or_default();
        account.locked = account.locked.checked_sub(amount).ok_or_else(|| {
            StakingError::custody(
                Collaborator::Credits,
                format!("cannot release {amount} credits for {node}: not locked"),
            )
        })?;
        account.available = account.available.saturating_add(amount);
        Ok(())
    }
}
