//! # Custody Adapter
//!
//! Boundary between the state machine and the external collaborators.
//!
//! Effects of one operation run inside a [`CustodyTransaction`], which
//! journals every applied effect together with its inverse. If a later
//! effect fails, the journal is unwound in reverse order:
//!
//! | Effect | Compensation |
//! |--------|--------------|
//! | `lock_credits` | `release_credits` |
//! | `release_credits` | `lock_credits` |
//! | `transfer` | `reverse_transfer` |
//! | `slash_participant` | none, always issued last |

use crate::domain::{Address, Amount, Collaborator, StakingError, StakingResult};
use crate::ports::{CreditsService, PayoutResolver, SlashingCollaborator, TransferReceipt, ValueTransfer};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Applied effect with enough data to undo it.
#[derive(Clone, Debug)]
enum CustodyEffect {
    CreditsLocked { node: Address, amount: Amount },
    CreditsReleased { node: Address, amount: Amount },
    Transferred(TransferReceipt),
}

/// Owns the collaborator handles.
pub struct CustodyAdapter<C, P, S, T>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
{
    credits: Arc<C>,
    payout: Arc<P>,
    slashing: Arc<S>,
    transfer: Arc<T>,
}

impl<C, P, S, T> CustodyAdapter<C, P, S, T>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
{
    pub fn new(credits: Arc<C>, payout: Arc<P>, slashing: Arc<S>, transfer: Arc<T>) -> Self {
        Self {
            credits,
            payout,
            slashing,
            transfer,
        }
    }

    /// Credits `node` may still lock.
    pub async fn available_credits(&self, node: &Address) -> StakingResult<Amount> {
        self.credits.available_credits(node).await
    }

    /// Destination for `node`'s native payouts, falling back to the node.
    pub async fn resolve_payout(&self, node: &Address) -> StakingResult<Address> {
        let resolved = self.payout.payout_address_for(node).await?;
        Ok(resolved.unwrap_or(*node))
    }

    /// Start a journaled unit of work.
    pub fn begin(&self) -> CustodyTransaction<'_, C, P, S, T> {
        CustodyTransaction {
            custody: self,
            journal: Vec::new(),
            finished: false,
        }
    }
}

/// One operation's custody effects.
///
/// Must end in [`commit`](Self::commit) or [`rollback`](Self::rollback).
pub struct CustodyTransaction<'a, C, P, S, T>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
{
    custody: &'a CustodyAdapter<C, P, S, T>,
    journal: Vec<CustodyEffect>,
    finished: bool,
}

impl<C, P, S, T> CustodyTransaction<'_, C, P, S, T>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
{
    /// Lock credits; zero is a no-op.
    pub async fn lock_credits(&mut self, node: &Address, amount: Amount) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.custody.credits.lock_credits(node, amount).await?;
        self.journal.push(CustodyEffect::CreditsLocked {
            node: *node,
            amount,
        });
        Ok(())
    }

    /// Release credits; zero is a no-op.
    pub async fn release_credits(&mut self, node: &Address, amount: Amount) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.custody.credits.release_credits(node, amount).await?;
        self.journal.push(CustodyEffect::CreditsReleased {
            node: *node,
            amount,
        });
        Ok(())
    }

    /// Transfer native value out of custody; zero is a no-op.
    pub async fn pay(&mut self, to: &Address, amount: Amount) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let receipt = self.custody.transfer.transfer(to, amount).await?;
        debug!("[qc-18] Transferred {} to {} ({})", amount, to, receipt.id);
        self.journal.push(CustodyEffect::Transferred(receipt));
        Ok(())
    }

    /// Notify the slashing collaborator. Irreversible; issue it last.
    pub async fn slash_participant(&mut self, node: &Address) -> StakingResult<()> {
        self.custody.slashing.slash_participant(node).await
    }

    /// Number of effects applied so far.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.journal.len()
    }

    /// Accept every applied effect and settle issued transfers.
    pub fn commit(mut self) {
        for effect in self.journal.drain(..) {
            if let CustodyEffect::Transferred(receipt) = effect {
                self.custody.transfer.finalize_transfer(&receipt);
            }
        }
        self.finished = true;
    }

    /// Undo applied effects in reverse order.
    ///
    /// Every compensation is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub async fn rollback(mut self) -> StakingResult<()> {
        let journal = std::mem::take(&mut self.journal);
        self.finished = true;

        let mut first_failure = None;
        for effect in journal.into_iter().rev() {
            let (collaborator, result) = match &effect {
                CustodyEffect::CreditsLocked { node, amount } => (
                    Collaborator::Credits,
                    self.custody.credits.release_credits(node, *amount).await,
                ),
                CustodyEffect::CreditsReleased { node, amount } => (
                    Collaborator::Credits,
                    self.custody.credits.lock_credits(node, *amount).await,
                ),
                CustodyEffect::Transferred(receipt) => (
                    Collaborator::ValueTransfer,
                    self.custody.transfer.reverse_transfer(receipt).await,
                ),
            };

            if let Err(e) = result {
                error!("[qc-18] Compensation of {:?} failed: {}", effect, e);
                first_failure.get_or_insert(StakingError::CompensationFailed {
                    collaborator,
                    reason: e.to_string(),
                });
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<C, P, S, T> Drop for CustodyTransaction<'_, C, P, S, T>
where
    C: CreditsService,
    P: PayoutResolver,
    S: SlashingCollaborator,
    T: ValueTransfer,
{
    fn drop(&mut self) {
        if !self.finished && !self.journal.is_empty() {
            warn!(
                "[qc-18] Custody transaction dropped with {} unresolved effects",
                self.journal.len()
            );
        }
    }
}
