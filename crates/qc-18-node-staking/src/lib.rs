//! # qc-18-node-staking
//!
//! Node Staking Ledger: bonds two-asset collateral (native value and
//! "credits") for network nodes, with a cool-down on voluntary exit and
//! administrator slashing.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Stake reconciliation**: set a total stake; credits are used first,
//!   native value covers the rest, and the attached payment must match exactly
//! - **Cool-down exit**: `request_unstake` then `force_unstake` after the delay
//! - **Administrator control**: `admin_unstake` and `slash` bypass the delay
//! - **Atomic operations**: every operation commits fully or leaves no trace
//!
//! ## Lifecycle
//!
//! ```text
//!             stake                 request_unstake
//! [UNSTAKED] ───────→ [STAKED] ─────────────────────→ [PENDING_UNSTAKED]
//!     ↑                 │  ↑ stake (adjust)                  │
//!     │                 │  └─────┘                           │
//!     │   admin_unstake │ slash                              │ force_unstake (after delay)
//!     │                 ↓                                    │ admin_unstake │ slash
//!     └─────────────────┴────────────────────────────────────┘
//! ```
//!
//! ## Collaborators
//!
//! | Port | Role |
//! |------|------|
//! | `CreditsService` | Locks and releases credits collateral |
//! | `PayoutResolver` | Redirects native payouts |
//! | `SlashingCollaborator` | Forfeits delegated credits on slash |
//! | `ValueTransfer` | Moves native value out of custody |
//! | `Clock` | Seconds for the cool-down |
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_node_staking::{StakingConfig, StakingService, StakingApi};
//!
//! let service = StakingService::new(
//!     StakingConfig::from_env(),
//!     credits,
//!     payout_resolver,
//!     slashing,
//!     value_transfer,
//!     Arc::new(SystemClock),
//! )?;
//!
//! // Stake 400 paying native for whatever credits do not cover.
//! let record = service.stake(node, Amount::from(400), payment).await?;
//!
//! service.request_unstake(node).await?;
//! // ... after the cool-down
//! service.force_unstake(node).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod custody;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

pub use config::StakingConfig;
pub use custody::{CustodyAdapter, CustodyTransaction};
pub use domain::{
    Address, Amount, Collaborator, CustodyTotals, ErrorKind, NodeStatus, Operation, Role,
    StakeAdjustment, StakingError, StakingRecord, StakingResult, Timestamp, U256,
};
pub use events::StakingEvent;
pub use ports::{
    Clock, CreditsService, PayoutResolver, SlashingCollaborator, StakingApi, TransferReceipt,
    ValueTransfer,
};
pub use service::StakingService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
