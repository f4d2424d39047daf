//! This crate contains the general types and pure functions shared across the rollup workspace:
//! hashes, addresses, account and strategy leaves, the transition sum type and its canonical
//! encoding, owner authorizations, and the observable event log entries.
//!
//! It is not intended to be used directly by end users, but rather to be used as a dependency by
//! other crates. Also note that this crate lies at the bottom of the crate-hierarchy in this
//! workspace i.e., it does not depend on any other crate in this workspace.

pub mod auth;
pub mod events;
pub mod leaves;
pub mod transition;
pub mod types;

pub use events::RollupEvent;
pub use leaves::{AccountLeaf, StrategyLeaf};
pub use transition::{RevertReason, Transition, TransitionKind};
pub use types::{
    AccountAddress, AccountId, Amount, AssetId, BlockId, ExternalAddress, Hash32, StrategyId,
    Timestamp,
};
