//! Driving Ports (API - Inbound)
//!
//! Every mutating call names its caller explicitly; authorization is derived
//! from that address and the current configuration only.

use crate::domain::{Address, Amount, StakingRecord, StakingResult};
use async_trait::async_trait;

/// Primary staking API.
#[async_trait]
pub trait StakingApi: Send + Sync {
    /// Set the caller's total stake to `requested_total`, attaching `payment`
    /// native value. Legal from `Unstaked` or `Staked`.
    ///
    /// Returns the committed record.
    async fn stake(
        &self,
        caller: Address,
        requested_total: Amount,
        payment: Amount,
    ) -> StakingResult<StakingRecord>;

    /// Begin the cool-down. Legal only from `Staked`.
    async fn request_unstake(&self, caller: Address) -> StakingResult<StakingRecord>;

    /// Withdraw everything once the cool-down has elapsed.
    ///
    /// Returns the record as it was before removal.
    async fn force_unstake(&self, caller: Address) -> StakingResult<StakingRecord>;

    /// Administrator withdrawal of `node`, bypassing the cool-down.
    async fn admin_unstake(&self, caller: Address, node: Address) -> StakingResult<StakingRecord>;

    /// Administrator forfeiture of all of `node`'s collateral.
    async fn slash(&self, caller: Address, node: Address) -> StakingResult<StakingRecord>;

    /// Stored record, or a zero-valued `Unstaked` record for non-participants.
    async fn get_staking_info(&self, node: Address) -> StakingRecord;

    /// All registered participants, in no particular order.
    async fn get_all_participants(&self) -> Vec<Address>;

    async fn get_minimum_stake(&self) -> Amount;

    async fn get_force_unstake_delay(&self) -> u64;

    async fn get_administrator(&self) -> Option<Address>;

    async fn get_owner(&self) -> Address;

    /// Owner only.
    async fn set_administrator(&self, caller: Address, administrator: Address)
        -> StakingResult<()>;

    /// Owner only.
    async fn set_minimum_stake(&self, caller: Address, amount: Amount) -> StakingResult<()>;

    /// Owner only.
    async fn set_force_unstake_delay(&self, caller: Address, delay_secs: u64)
        -> StakingResult<()>;
}
