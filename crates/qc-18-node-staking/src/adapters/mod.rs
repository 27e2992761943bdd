//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by tests,
//! simulations and single-process deployments.

mod clock;
mod credits;
mod payout;
mod slashing;
mod transfer;

pub use clock::{ManualClock, SystemClock};
pub use credits::{CreditsAccount, InMemoryCreditsLedger};
pub use payout::StaticPayoutResolver;
pub use slashing::CreditsSlashingAdapter;
pub use transfer::InMemoryValueTransfer;
