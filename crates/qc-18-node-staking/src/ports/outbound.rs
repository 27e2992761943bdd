//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Collaborators the ledger calls out to. Each call may fail; a failure
//! aborts the calling operation.

use crate::domain::{Address, Amount, StakingResult, Timestamp};
use async_trait::async_trait;
use uuid::Uuid;

/// Secondary-balance ("credits") accounting service.
#[async_trait]
pub trait CreditsService: Send + Sync {
    /// Credits the node may still lock as collateral.
    async fn available_credits(&self, node: &Address) -> StakingResult<Amount>;

    /// Lock `amount` credits as collateral for `node`.
    async fn lock_credits(&self, node: &Address, amount: Amount) -> StakingResult<()>;

    /// Release `amount` previously locked credits back to `node`.
    async fn release_credits(&self, node: &Address, amount: Amount) -> StakingResult<()>;
}

/// Maps a node to an alternate destination for native payouts.
#[async_trait]
pub trait PayoutResolver: Send + Sync {
    /// `None` means pay the node itself.
    async fn payout_address_for(&self, node: &Address) -> StakingResult<Option<Address>>;
}

/// Delegated-staking subsystem notified of forfeitures.
///
/// Credits forfeiture is carried out by this collaborator. The call cannot be
/// undone, so the ledger always issues it as the last effect of a slash.
#[async_trait]
pub trait SlashingCollaborator: Send + Sync {
    async fn slash_participant(&self, node: &Address) -> StakingResult<()>;
}

/// Proof of a completed native transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub id: Uuid,
    pub to: Address,
    pub amount: Amount,
}

/// Native value-transfer primitive. Each transfer is atomic on its own.
#[async_trait]
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` out of ledger custody to `to`.
    async fn transfer(&self, to: &Address, amount: Amount) -> StakingResult<TransferReceipt>;

    /// Revert a transfer issued earlier in the same operation.
    async fn reverse_transfer(&self, receipt: &TransferReceipt) -> StakingResult<()>;

    /// The operation that issued `receipt` committed; it can no longer be
    /// reversed.
    fn finalize_transfer(&self, receipt: &TransferReceipt);
}

/// Coarse, non-decreasing time source in whole seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
