//! # Ledger Property Tests (qc-18)
//!
//! Random operation sequences, including collaborator outages, must keep
//! membership, positive-stake and native conservation intact after every
//! step.

mod common;

use common::*;
use proptest::prelude::*;
use qc_18_node_staking::domain::reconcile;
use qc_18_node_staking::{Amount, StakingApi};

#[derive(Clone, Debug)]
enum Op {
    Deposit { node: u8, credits: u64 },
    Stake { node: u8, total: u64, exact: bool },
    RequestUnstake { node: u8 },
    ForceUnstake { node: u8 },
    AdminUnstake { node: u8 },
    Slash { node: u8 },
    Advance { secs: u64 },
    TransferOutage(bool),
    CreditsOutage(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let node = 1u8..=4;
    prop_oneof![
        (node.clone(), 0u64..500).prop_map(|(node, credits)| Op::Deposit { node, credits }),
        (node.clone(), 0u64..1_500, prop::bool::weighted(0.8))
            .prop_map(|(node, total, exact)| Op::Stake { node, total, exact }),
        (node.clone(), 0u64..1_500, prop::bool::weighted(0.8))
            .prop_map(|(node, total, exact)| Op::Stake { node, total, exact }),
        node.clone().prop_map(|node| Op::RequestUnstake { node }),
        node.clone().prop_map(|node| Op::ForceUnstake { node }),
        node.clone().prop_map(|node| Op::AdminUnstake { node }),
        node.prop_map(|node| Op::Slash { node }),
        (0u64..200).prop_map(|secs| Op::Advance { secs }),
        prop::bool::weighted(0.2).prop_map(Op::TransferOutage),
        prop::bool::weighted(0.2).prop_map(Op::CreditsOutage),
    ]
}

async fn apply(h: &Harness, op: &Op) {
    let result = match *op {
        Op::Deposit { node: id, credits } => {
            h.credits.deposit(node(id), amt(credits));
            Ok(())
        }
        Op::Stake {
            node: id,
            total,
            exact,
        } => {
            let info = h.service.get_staking_info(node(id)).await;
            let available = h.credits.account(&node(id)).available;
            let payment = match reconcile(
                info.native_balance,
                info.credits_balance,
                amt(total),
                available,
            ) {
                Ok(adjustment) if exact => adjustment.required_payment(),
                _ => amt(total).saturating_add(Amount::one()),
            };
            h.service
                .stake(node(id), amt(total), payment)
                .await
                .map(|record| {
                    assert_eq!(record.total_stake().unwrap(), amt(total));
                })
        }
        Op::RequestUnstake { node: id } => h.service.request_unstake(node(id)).await.map(|_| ()),
        Op::ForceUnstake { node: id } => h.service.force_unstake(node(id)).await.map(|_| ()),
        Op::AdminUnstake { node: id } => h
            .service
            .admin_unstake(ADMIN, node(id))
            .await
            .map(|_| ()),
        Op::Slash { node: id } => h.service.slash(ADMIN, node(id)).await.map(|_| ()),
        Op::Advance { secs } => {
            h.clock.advance(secs);
            Ok(())
        }
        Op::TransferOutage(failing) => {
            h.transfer.set_failing(failing);
            Ok(())
        }
        Op::CreditsOutage(failing) => {
            h.credits.set_failing(failing);
            Ok(())
        }
    };

    // Failures are expected; only invariants matter here.
    let _ = result;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_after_every_step(ops in prop::collection::vec(op_strategy(), 1..48)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = harness_with(
                default_config()
                    .minimum_stake(amt(100))
                    .force_unstake_delay_secs(100)
                    .max_participants(3),
            );

            for op in &ops {
                apply(&h, op).await;

                prop_assert!(h.service.check_invariants().is_ok(), "after {:?}", op);

                let participants = h.service.get_all_participants().await;
                prop_assert!(participants.len() <= 3);

                let mut native_held = Amount::zero();
                for participant in &participants {
                    let info = h.service.get_staking_info(*participant).await;
                    prop_assert!(!info.is_empty());
                    native_held += info.native_balance;
                }

                let totals = h.service.custody_totals();
                prop_assert_eq!(totals.held().unwrap(), native_held);
                prop_assert_eq!(
                    h.transfer.total_paid(),
                    totals.native_returned + totals.native_forfeited
                );
            }
            Ok(())
        })?;
    }
}
