//! # Ports Layer (Hexagonal Architecture)
//!
//! - `inbound`: the staking API this subsystem offers
//! - `outbound`: collaborators it depends on

pub mod inbound;
pub mod outbound;

pub use inbound::StakingApi;
pub use outbound::{
    Clock, CreditsService, PayoutResolver, SlashingCollaborator, TransferReceipt, ValueTransfer,
};
