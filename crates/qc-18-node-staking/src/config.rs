//! Configuration for the staking ledger.
//!
//! The configuration passed to `StakingService::new` becomes the ledger's
//! live settings; afterwards it changes only through the owner's
//! `set_*` operations.

use crate::domain::{Address, Amount, StakingError, StakingResult};
use serde::Deserialize;
use std::env;

/// Default minimum total stake.
pub const DEFAULT_MINIMUM_STAKE: u64 = 400;

/// Default cool-down between `request_unstake` and `force_unstake` (7 days).
pub const DEFAULT_FORCE_UNSTAKE_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

/// Default bound on registered participants.
pub const DEFAULT_MAX_PARTICIPANTS: usize = 1000;

/// Default buffer for event subscribers.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Staking ledger configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct StakingConfig {
    /// Owner and treasury: receives slashed native value, manages settings.
    pub owner: Address,

    /// Identity allowed to admin-unstake and slash. Must differ from owner.
    #[serde(default)]
    pub administrator: Option<Address>,

    /// Minimum total stake (native + credits).
    pub minimum_stake: Amount,

    /// Seconds that must pass after `request_unstake`.
    pub force_unstake_delay_secs: u64,

    /// Maximum number of registered participants.
    pub max_participants: usize,

    /// Broadcast buffer for `StakingEvent` subscribers.
    pub event_channel_capacity: usize,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            administrator: None,
            minimum_stake: Amount::from(DEFAULT_MINIMUM_STAKE),
            force_unstake_delay_secs: DEFAULT_FORCE_UNSTAKE_DELAY_SECS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl StakingConfig {
    /// Defaults with the given owner.
    pub fn with_owner(owner: Address) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn administrator(mut self, administrator: Address) -> Self {
        self.administrator = Some(administrator);
        self
    }

    pub fn minimum_stake(mut self, amount: Amount) -> Self {
        self.minimum_stake = amount;
        self
    }

    pub fn force_unstake_delay_secs(mut self, secs: u64) -> Self {
        self.force_unstake_delay_secs = secs;
        self
    }

    pub fn max_participants(mut self, max: usize) -> Self {
        self.max_participants = max;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_STAKING_OWNER`: owner address, hex (default: zero, rejected by `validate`)
    /// - `QC_STAKING_ADMINISTRATOR`: administrator address, hex (default: unset)
    /// - `QC_STAKING_MIN_STAKE`: decimal minimum stake (default: 400)
    /// - `QC_STAKING_UNSTAKE_DELAY_SECS`: cool-down seconds (default: 604800)
    /// - `QC_STAKING_MAX_PARTICIPANTS`: registry bound (default: 1000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            owner: env::var("QC_STAKING_OWNER")
                .ok()
                .and_then(|v| Address::from_hex(&v))
                .unwrap_or(defaults.owner),

            administrator: env::var("QC_STAKING_ADMINISTRATOR")
                .ok()
                .and_then(|v| Address::from_hex(&v)),

            minimum_stake: env::var("QC_STAKING_MIN_STAKE")
                .ok()
                .and_then(|v| Amount::from_dec_str(&v).ok())
                .unwrap_or(defaults.minimum_stake),

            force_unstake_delay_secs: env::var("QC_STAKING_UNSTAKE_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.force_unstake_delay_secs),

            max_participants: env::var("QC_STAKING_MAX_PARTICIPANTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_participants),

            event_channel_capacity: defaults.event_channel_capacity,
        }
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> StakingResult<()> {
        if self.owner.is_zero() {
            return Err(StakingError::InvalidConfig(
                "owner address must be set".to_string(),
            ));
        }
        if let Some(administrator) = self.administrator {
            validate_administrator(&self.owner, &administrator)?;
        }
        if self.max_participants == 0 {
            return Err(StakingError::InvalidConfig(
                "max_participants must be positive".to_string(),
            ));
        }
        if self.event_channel_capacity == 0 {
            return Err(StakingError::InvalidConfig(
                "event_channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// The administrator is a distinct, non-zero identity.
pub(crate) fn validate_administrator(owner: &Address, administrator: &Address) -> StakingResult<()> {
    if administrator.is_zero() {
        return Err(StakingError::InvalidConfig(
            "administrator address must be non-zero".to_string(),
        ));
    }
    if administrator == owner {
        return Err(StakingError::InvalidConfig(
            "administrator must differ from owner".to_string(),
        ));
    }
    Ok(())
}
