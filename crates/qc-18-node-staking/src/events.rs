//! # Staking Events
//!
//! Published after a successful commit only; a failed operation emits
//! nothing.

use crate::domain::{Address, Amount, StakingRecord, Timestamp};
use serde::{Deserialize, Serialize};

/// Ledger notifications.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StakingEvent {
    /// Stake set, topped up, partially withdrawn or re-confirmed.
    NodeStaked {
        node: Address,
        native_balance: Amount,
        credits_balance: Amount,
    },
    /// Cool-down started.
    NodeTryUnstaked {
        node: Address,
        requested_at: Timestamp,
    },
    /// Collateral returned and record removed.
    NodeUnstaked {
        node: Address,
        native_balance: Amount,
        credits_balance: Amount,
    },
    /// Collateral forfeited and record removed.
    NodeSlashed {
        node: Address,
        native_balance: Amount,
        credits_balance: Amount,
    },
    AdministratorChanged {
        previous: Option<Address>,
        current: Address,
    },
    MinimumStakeChanged {
        previous: Amount,
        current: Amount,
    },
    ForceUnstakeDelayChanged {
        previous_secs: u64,
        current_secs: u64,
    },
}

impl StakingEvent {
    pub(crate) fn staked(record: &StakingRecord) -> Self {
        Self::NodeStaked {
            node: record.node,
            native_balance: record.native_balance,
            credits_balance: record.credits_balance,
        }
    }

    pub(crate) fn unstaked(record: &StakingRecord) -> Self {
        Self::NodeUnstaked {
            node: record.node,
            native_balance: record.native_balance,
            credits_balance: record.credits_balance,
        }
    }

    pub(crate) fn slashed(record: &StakingRecord) -> Self {
        Self::NodeSlashed {
            node: record.node,
            native_balance: record.native_balance,
            credits_balance: record.credits_balance,
        }
    }

    /// Node the event concerns, if any.
    #[must_use]
    pub fn node(&self) -> Option<Address> {
        match self {
            Self::NodeStaked { node, .. }
            | Self::NodeTryUnstaked { node, .. }
            | Self::NodeUnstaked { node, .. }
            | Self::NodeSlashed { node, .. } => Some(*node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged() {
        let event = StakingEvent::NodeTryUnstaked {
            node: Address::new([1; 20]),
            requested_at: 1_000,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NodeTryUnstaked");
        assert_eq!(json["requested_at"], 1_000);
    }

    #[test]
    fn test_node_accessor() {
        let node = Address::new([3; 20]);
        let event = StakingEvent::slashed(&StakingRecord::new(node));
        assert_eq!(event.node(), Some(node));

        let config_event = StakingEvent::ForceUnstakeDelayChanged {
            previous_secs: 1,
            current_secs: 2,
        };
        assert_eq!(config_event.node(), None);
    }
}
