//! # Domain Module
//!
//! Core staking types, the balance reconciler and ledger invariants.
//! Nothing in here performs I/O.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod reconciler;
pub mod registry;
pub mod store;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use reconciler::*;
pub use registry::*;
pub use store::*;
pub use value_objects::*;
