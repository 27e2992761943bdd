//! # Balance Reconciler
//!
//! Pure split of a stake adjustment between native value and credits.
//!
//! - Increase: credits are consumed first, the remainder is paid natively.
//! - Decrease: native value is returned first, the remainder releases credits.
//! - Equal: nothing moves.
//!
//! The caller's native payment must equal the computed requirement exactly.

use super::errors::{StakingError, StakingResult};
use super::value_objects::Amount;

/// Asset movements needed to reach a requested total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeAdjustment {
    /// Stake grows; `native_required` must be paid with the call.
    Increase {
        credits_to_lock: Amount,
        native_required: Amount,
    },
    /// Stake shrinks; nothing may be paid with the call.
    Decrease {
        native_to_return: Amount,
        credits_to_release: Amount,
    },
    /// Requested total equals the current total.
    Unchanged,
}

impl StakeAdjustment {
    /// Native payment the caller must attach.
    #[must_use]
    pub fn required_payment(&self) -> Amount {
        match self {
            Self::Increase {
                native_required, ..
            } => *native_required,
            Self::Decrease { .. } | Self::Unchanged => Amount::zero(),
        }
    }

    /// Balances after the adjustment, as `(native, credits)`.
    pub fn apply_to(&self, native: Amount, credits: Amount) -> StakingResult<(Amount, Amount)> {
        match self {
            Self::Increase {
                credits_to_lock,
                native_required,
            } => Ok((
                native
                    .checked_add(*native_required)
                    .ok_or(StakingError::ArithmeticOverflow)?,
                credits
                    .checked_add(*credits_to_lock)
                    .ok_or(StakingError::ArithmeticOverflow)?,
            )),
            Self::Decrease {
                native_to_return,
                credits_to_release,
            } => Ok((
                native
                    .checked_sub(*native_to_return)
                    .ok_or(StakingError::ArithmeticOverflow)?,
                credits
                    .checked_sub(*credits_to_release)
                    .ok_or(StakingError::ArithmeticOverflow)?,
            )),
            Self::Unchanged => Ok((native, credits)),
        }
    }
}

/// Derive the adjustment from `(current_native, current_credits)` to
/// `requested_total`, given how many credits the node may still lock.
pub fn reconcile(
    current_native: Amount,
    current_credits: Amount,
    requested_total: Amount,
    available_credits: Amount,
) -> StakingResult<StakeAdjustment> {
    let current_total = current_native
        .checked_add(current_credits)
        .ok_or(StakingError::ArithmeticOverflow)?;

    if requested_total > current_total {
        let deficit = requested_total - current_total;
        let credits_to_lock = deficit.min(available_credits);
        Ok(StakeAdjustment::Increase {
            credits_to_lock,
            native_required: deficit - credits_to_lock,
        })
    } else if requested_total < current_total {
        let surplus = current_total - requested_total;
        let native_to_return = surplus.min(current_native);
        let credits_to_release = surplus - native_to_return;
        if credits_to_release > current_credits {
            return Err(StakingError::ArithmeticOverflow);
        }
        Ok(StakeAdjustment::Decrease {
            native_to_return,
            credits_to_release,
        })
    } else {
        Ok(StakeAdjustment::Unchanged)
    }
}

/// Exact-payment law: `payment` must equal the adjustment's requirement.
pub fn verify_payment(adjustment: &StakeAdjustment, payment: Amount) -> StakingResult<()> {
    let required = adjustment.required_payment();
    if payment != required {
        return Err(StakingError::PaymentMismatch {
            supplied: payment,
            required,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn amt(v: u64) -> Amount {
        Amount::from(v)
    }

    #[test]
    fn test_increase_without_credits_is_all_native() {
        let adj = reconcile(amt(0), amt(0), amt(400), amt(0)).unwrap();
        assert_eq!(
            adj,
            StakeAdjustment::Increase {
                credits_to_lock: amt(0),
                native_required: amt(400),
            }
        );
        assert_eq!(adj.required_payment(), amt(400));
    }

    #[test]
    fn test_increase_prefers_credits() {
        let adj = reconcile(amt(100), amt(50), amt(400), amt(200)).unwrap();
        assert_eq!(
            adj,
            StakeAdjustment::Increase {
                credits_to_lock: amt(200),
                native_required: amt(50),
            }
        );
    }

    #[test]
    fn test_increase_fully_covered_by_credits() {
        let adj = reconcile(amt(0), amt(0), amt(400), amt(1_000)).unwrap();
        assert_eq!(adj.required_payment(), amt(0));
        assert_eq!(adj.apply_to(amt(0), amt(0)).unwrap(), (amt(0), amt(400)));
    }

    #[test]
    fn test_decrease_returns_native_first() {
        let adj = reconcile(amt(300), amt(200), amt(400), amt(0)).unwrap();
        assert_eq!(
            adj,
            StakeAdjustment::Decrease {
                native_to_return: amt(100),
                credits_to_release: amt(0),
            }
        );
    }

    #[test]
    fn test_decrease_spills_into_credits() {
        let adj = reconcile(amt(100), amt(500), amt(450), amt(0)).unwrap();
        assert_eq!(
            adj,
            StakeAdjustment::Decrease {
                native_to_return: amt(100),
                credits_to_release: amt(50),
            }
        );
        assert_eq!(adj.apply_to(amt(100), amt(500)).unwrap(), (amt(0), amt(450)));
    }

    #[test]
    fn test_equal_is_unchanged() {
        let adj = reconcile(amt(200), amt(200), amt(400), amt(999)).unwrap();
        assert_eq!(adj, StakeAdjustment::Unchanged);
        assert_eq!(adj.required_payment(), amt(0));
    }

    #[test]
    fn test_payment_must_be_exact() {
        let adj = reconcile(amt(0), amt(0), amt(400), amt(0)).unwrap();
        assert!(verify_payment(&adj, amt(400)).is_ok());
        assert_eq!(
            verify_payment(&adj, amt(401)),
            Err(StakingError::PaymentMismatch {
                supplied: amt(401),
                required: amt(400),
            })
        );
        assert!(matches!(
            verify_payment(&adj, amt(399)),
            Err(StakingError::PaymentMismatch { .. })
        ));
    }

    #[test]
    fn test_payment_rejected_on_decrease_and_unchanged() {
        let decrease = reconcile(amt(500), amt(0), amt(400), amt(0)).unwrap();
        assert!(verify_payment(&decrease, amt(1)).is_err());
        assert!(verify_payment(&decrease, amt(0)).is_ok());

        let unchanged = StakeAdjustment::Unchanged;
        assert!(verify_payment(&unchanged, amt(1)).is_err());
    }

    #[test]
    fn test_current_total_overflow() {
        assert_eq!(
            reconcile(Amount::MAX, amt(1), amt(0), amt(0)),
            Err(StakingError::ArithmeticOverflow)
        );
    }

    proptest! {
        #[test]
        fn prop_adjustment_reaches_requested_total(
            native in 0u64..1_000_000,
            credits in 0u64..1_000_000,
            requested in 0u64..3_000_000,
            available in 0u64..2_000_000,
        ) {
            let adj = reconcile(amt(native), amt(credits), amt(requested), amt(available)).unwrap();
            let (new_native, new_credits) = adj.apply_to(amt(native), amt(credits)).unwrap();
            prop_assert_eq!(new_native + new_credits, amt(requested));
        }

        #[test]
        fn prop_increase_consumes_credits_first(
            native in 0u64..1_000_000,
            credits in 0u64..1_000_000,
            extra in 1u64..1_000_000,
            available in 0u64..2_000_000,
        ) {
            let requested = native + credits + extra;
            let adj = reconcile(amt(native), amt(credits), amt(requested), amt(available)).unwrap();
            match adj {
                StakeAdjustment::Increase { credits_to_lock, native_required } => {
                    prop_assert_eq!(credits_to_lock, amt(extra.min(available)));
                    prop_assert_eq!(credits_to_lock + native_required, amt(extra));
                    prop_assert!(credits_to_lock <= amt(available));
                }
                other => prop_assert!(false, "expected increase, got {:?}", other),
            }
        }

        #[test]
        fn prop_decrease_returns_native_first(
            native in 0u64..1_000_000,
            credits in 0u64..1_000_000,
            requested_fraction in 0u64..100,
        ) {
            let current = native + credits;
            prop_assume!(current > 0);
            let requested = current * requested_fraction / 100;
            prop_assume!(requested < current);

            let adj = reconcile(amt(native), amt(credits), amt(requested), amt(0)).unwrap();
            match adj {
                StakeAdjustment::Decrease { native_to_return, credits_to_release } => {
                    prop_assert_eq!(native_to_return + credits_to_release, amt(current - requested));
                    prop_assert!(native_to_return <= amt(native));
                    prop_assert!(credits_to_release <= amt(credits));
                    if !credits_to_release.is_zero() {
                        prop_assert_eq!(native_to_return, amt(native));
                    }
                }
                other => prop_assert!(false, "expected decrease, got {:?}", other),
            }
        }

        #[test]
        fn prop_only_exact_payment_accepted(
            native in 0u64..1_000_000,
            credits in 0u64..1_000_000,
            requested in 0u64..3_000_000,
            available in 0u64..2_000_000,
            payment in 0u64..3_000_000,
        ) {
            let adj = reconcile(amt(native), amt(credits), amt(requested), amt(available)).unwrap();
            let accepted = verify_payment(&adj, amt(payment)).is_ok();
            prop_assert_eq!(accepted, amt(payment) == adj.required_payment());
        }
    }
}
