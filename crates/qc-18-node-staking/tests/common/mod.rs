//! Shared fixtures for the staking ledger integration tests.

#![allow(dead_code)]

use qc_18_node_staking::adapters::{
    CreditsSlashingAdapter, InMemoryCreditsLedger, InMemoryValueTransfer, ManualClock,
    StaticPayoutResolver,
};
use qc_18_node_staking::{Address, Amount, StakingConfig, StakingService};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

pub const OWNER: Address = Address::new([0xAA; 20]);
pub const ADMIN: Address = Address::new([0xBB; 20]);

/// Start of every test clock.
pub const GENESIS: u64 = 1_700_000_000;

pub type TestService = StakingService<
    InMemoryCreditsLedger,
    StaticPayoutResolver,
    CreditsSlashingAdapter,
    InMemoryValueTransfer,
    ManualClock,
>;

pub struct Harness {
    pub service: TestService,
    pub credits: Arc<InMemoryCreditsLedger>,
    pub payout: Arc<StaticPayoutResolver>,
    pub slashing: Arc<CreditsSlashingAdapter>,
    pub transfer: Arc<InMemoryValueTransfer>,
    pub clock: Arc<ManualClock>,
}

static TRACING: Once = Once::new();

/// Route ledger logs to the test writer; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn node(id: u8) -> Address {
    Address::new([id; 20])
}

pub fn amt(value: u64) -> Amount {
    Amount::from(value)
}

pub fn default_config() -> StakingConfig {
    StakingConfig::with_owner(OWNER).administrator(ADMIN)
}

pub fn harness() -> Harness {
    harness_with(default_config())
}

pub fn harness_with(config: StakingConfig) -> Harness {
    init_tracing();
    let credits = Arc::new(InMemoryCreditsLedger::new());
    let payout = Arc::new(StaticPayoutResolver::new());
    let slashing = Arc::new(CreditsSlashingAdapter::new(Arc::clone(&credits)));
    let transfer = Arc::new(InMemoryValueTransfer::new());
    let clock = Arc::new(ManualClock::new(GENESIS));

    let service = StakingService::new(
        config,
        Arc::clone(&credits),
        Arc::clone(&payout),
        Arc::clone(&slashing),
        Arc::clone(&transfer),
        Arc::clone(&clock),
    )
    .expect("valid test config");

    Harness {
        service,
        credits,
        payout,
        slashing,
        transfer,
        clock,
    }
}
