//! # Domain Entities
//!
//! Staking records, participant status and the ledger's custody counters.

use super::errors::{StakingError, StakingResult};
use super::value_objects::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// NODE STATUS
// =============================================================================

/// Lifecycle status of a participant.
///
/// ```text
/// [Unstaked] ──stake──→ [Staked] ──request_unstake──→ [PendingUnstaked]
///      ↑                   │  ↺ stake                        │
///      └───────────────────┴──── admin_unstake / slash ──────┤
///      └──────────────────────── force_unstake ──────────────┘
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStatus {
    /// No collateral held; the absent-record state.
    #[default]
    Unstaked,
    /// Collateral locked and participating.
    Staked,
    /// Withdrawal requested, waiting for the cool-down.
    PendingUnstaked,
}

impl NodeStatus {
    /// Whether a node in this status is a registry member.
    #[must_use]
    pub fn is_participating(self) -> bool {
        !matches!(self, Self::Unstaked)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unstaked => "Unstaked",
            Self::Staked => "Staked",
            Self::PendingUnstaked => "PendingUnstaked",
        };
        f.write_str(name)
    }
}

/// Public state-machine operations, used in errors and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Stake,
    RequestUnstake,
    ForceUnstake,
    AdminUnstake,
    Slash,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stake => "stake",
            Self::RequestUnstake => "request_unstake",
            Self::ForceUnstake => "force_unstake",
            Self::AdminUnstake => "admin_unstake",
            Self::Slash => "slash",
        };
        f.write_str(name)
    }
}

// =============================================================================
// STAKING RECORD
// =============================================================================

/// Collateral held for one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingRecord {
    /// Participant address.
    pub node: Address,
    /// Native-value collateral held by the ledger.
    pub native_balance: Amount,
    /// Credits collateral locked with the credits service.
    pub credits_balance: Amount,
    /// Lifecycle status.
    pub status: NodeStatus,
    /// Set only while `PendingUnstaked`.
    pub unstake_requested_at: Option<Timestamp>,
}

impl StakingRecord {
    /// Zero-valued record for a node that has never staked.
    #[must_use]
    pub fn new(node: Address) -> Self {
        Self {
            node,
            native_balance: Amount::zero(),
            credits_balance: Amount::zero(),
            status: NodeStatus::Unstaked,
            unstake_requested_at: None,
        }
    }

    /// Native plus credits.
    pub fn total_stake(&self) -> StakingResult<Amount> {
        self.native_balance
            .checked_add(self.credits_balance)
            .ok_or(StakingError::ArithmeticOverflow)
    }

    /// True when no collateral of either kind is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.native_balance.is_zero() && self.credits_balance.is_zero()
    }
}

// =============================================================================
// CUSTODY TOTALS
// =============================================================================

/// Running native-value counters for the conservation check.
///
/// `native_accepted - native_returned - native_forfeited` must always equal the
/// sum of `native_balance` over all records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyTotals {
    /// Native payments accepted by `stake`.
    pub native_accepted: Amount,
    /// Native value paid back to participants.
    pub native_returned: Amount,
    /// Native value forfeited to the treasury.
    pub native_forfeited: Amount,
}

impl CustodyTotals {
    /// Native value the ledger should currently hold.
    pub fn held(&self) -> StakingResult<Amount> {
        self.native_accepted
            .checked_sub(self.native_returned)
            .and_then(|rest| rest.checked_sub(self.native_forfeited))
            .ok_or(StakingError::ArithmeticOverflow)
    }

    pub(crate) fn record_accepted(&mut self, amount: Amount) {
        self.native_accepted = self.native_accepted.saturating_add(amount);
    }

    pub(crate) fn record_returned(&mut self, amount: Amount) {
        self.native_returned = self.native_returned.saturating_add(amount);
    }

    pub(crate) fn record_forfeited(&mut self, amount: Amount) {
        self.native_forfeited = self.native_forfeited.saturating_add(amount);
    }
}
