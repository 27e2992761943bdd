//! # Domain Errors
//!
//! Every error aborts the triggering operation with no partial effect.

use super::entities::{NodeStatus, Operation};
use super::value_objects::{Address, Amount, Timestamp};
use std::fmt;
use thiserror::Error;

/// Privileged roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Administrator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => f.write_str("owner"),
            Self::Administrator => f.write_str("administrator"),
        }
    }
}

/// External collaborators reached through the custody adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collaborator {
    Credits,
    PayoutResolver,
    Slashing,
    ValueTransfer,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credits => f.write_str("credits service"),
            Self::PayoutResolver => f.write_str("payout resolver"),
            Self::Slashing => f.write_str("slashing collaborator"),
            Self::ValueTransfer => f.write_str("value transfer"),
        }
    }
}

/// Error classification surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Authorization,
    Capacity,
    Amount,
    State,
    Timing,
    CustodyTransfer,
    Configuration,
}

/// Staking subsystem errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StakingError {
    /// Caller does not hold the required role.
    #[error("Unauthorized: {caller} is not the {role}")]
    Unauthorized { caller: Address, role: Role },

    /// Administrator-only operation with no administrator configured.
    #[error("No administrator configured")]
    AdministratorNotSet,

    /// Registry already holds `max` participants.
    #[error("Participant registry full: {max} nodes")]
    RegistryFull { max: usize },

    /// Requested total is below the configured minimum.
    #[error("Requested stake {requested} below minimum {minimum}")]
    BelowMinimumStake { requested: Amount, minimum: Amount },

    /// Supplied native payment differs from the computed requirement.
    #[error("Payment mismatch: supplied {supplied}, required {required}")]
    PaymentMismatch { supplied: Amount, required: Amount },

    /// A positive stake amount is required.
    #[error("Stake amount must be positive")]
    ZeroAmount,

    /// Withdrawal or slash of a record holding nothing.
    #[error("Node {node} holds no stake")]
    ZeroStake { node: Address },

    /// Overflow or underflow in collateral arithmetic.
    #[error("Arithmetic overflow in stake accounting")]
    ArithmeticOverflow,

    /// Operation not legal from the node's current status.
    #[error("Cannot {operation} node {node} in status {status}")]
    InvalidStatus {
        node: Address,
        status: NodeStatus,
        operation: Operation,
    },

    /// Another operation on the same node has not finished.
    #[error("Operation already in flight for node {node}")]
    OperationInProgress { node: Address },

    /// force_unstake before the cool-down elapsed.
    #[error("Unstake cool-down active for {node}: now {now}, unlocks after {unlocks_at}")]
    CooldownActive {
        node: Address,
        now: Timestamp,
        unlocks_at: Timestamp,
    },

    /// A collaborator or the transfer primitive failed.
    #[error("{collaborator} failed: {reason}")]
    Custody {
        collaborator: Collaborator,
        reason: String,
    },

    /// Undoing an already-applied custody effect failed.
    #[error("Rollback of {collaborator} effect failed: {reason}")]
    CompensationFailed {
        collaborator: Collaborator,
        reason: String,
    },

    /// Ledger consistency check failed.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StakingError {
    /// Builds a collaborator failure.
    pub fn custody(collaborator: Collaborator, reason: impl Into<String>) -> Self {
        Self::Custody {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::AdministratorNotSet => ErrorKind::Authorization,
            Self::RegistryFull { .. } => ErrorKind::Capacity,
            Self::BelowMinimumStake { .. }
            | Self::PaymentMismatch { .. }
            | Self::ZeroAmount
            | Self::ZeroStake { .. }
            | Self::ArithmeticOverflow => ErrorKind::Amount,
            Self::InvalidStatus { .. }
            | Self::OperationInProgress { .. }
            | Self::InvariantViolation(_) => ErrorKind::State,
            Self::CooldownActive { .. } => ErrorKind::Timing,
            Self::Custody { .. } | Self::CompensationFailed { .. } => ErrorKind::CustodyTransfer,
            Self::InvalidConfig(_) => ErrorKind::Configuration,
        }
    }
}

/// Result type for staking operations.
pub type StakingResult<T> = Result<T, StakingError>;
