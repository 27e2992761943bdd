//! # Domain Invariants
//!
//! Ledger-wide consistency rules, checked over committed state.
//!
//! | Invariant | Rule |
//! |-----------|------|
//! | Membership | Registry members and stored records are the same set of nodes, all participating |
//! | Positive stake | Every participating record holds `native + credits > 0` |
//! | Conservation | `accepted - returned - forfeited == Σ native_balance` |

use super::entities::CustodyTotals;
use super::errors::{StakingError, StakingResult};
use super::registry::NodeRegistry;
use super::store::StakingStore;
use super::value_objects::Amount;

/// Registry members and stored records describe the same participants.
pub fn invariant_membership(registry: &NodeRegistry, store: &StakingStore) -> StakingResult<()> {
    for node in registry.iter() {
        match store.get(node) {
            Some(record) if record.status.is_participating() => {}
            Some(record) => {
                return Err(StakingError::InvariantViolation(format!(
                    "registered node {node} has status {}",
                    record.status
                )))
            }
            None => {
                return Err(StakingError::InvariantViolation(format!(
                    "registered node {node} has no record"
                )))
            }
        }
    }

    for record in store.records() {
        if !registry.contains(&record.node) {
            return Err(StakingError::InvariantViolation(format!(
                "record for {} is not registered",
                record.node
            )));
        }
    }

    Ok(())
}

/// Every participating record holds collateral.
pub fn invariant_positive_stake(store: &StakingStore) -> StakingResult<()> {
    for record in store.records() {
        if record.status.is_participating() && record.total_stake()?.is_zero() {
            return Err(StakingError::InvariantViolation(format!(
                "participating node {} holds zero stake",
                record.node
            )));
        }
    }
    Ok(())
}

/// Native value held equals accepted minus returned minus forfeited.
pub fn invariant_conservation(store: &StakingStore, totals: &CustodyTotals) -> StakingResult<()> {
    let mut recorded = Amount::zero();
    for record in store.records() {
        recorded = recorded
            .checked_add(record.native_balance)
            .ok_or(StakingError::ArithmeticOverflow)?;
    }

    let held = totals.held()?;
    if recorded != held {
        return Err(StakingError::InvariantViolation(format!(
            "records hold {recorded} native but custody counters imply {held}"
        )));
    }
    Ok(())
}
