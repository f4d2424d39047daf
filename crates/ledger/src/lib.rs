//! # Rollup Ledger
//!
//! The orchestrator of the custodial yield rollup: intake queues for deposits, withdrawals and
//! balance syncs, the append-only list of block commitments, the challenge clock, block
//! execution against the strategy collaborators, and the Merkle-proof-based dispute resolver.
//!
//! Blocks are accepted optimistically: `commit_block` stores only a commitment to the ordered
//! transition list and cross-checks it structurally against the intake queues, without
//! evaluating a single transition. During the challenge window anyone may call
//! [`RollupLedger::dispute_transition`] with inclusion proofs; a successful dispute flips the
//! block to `Reverted` and rewinds its queue entries, a failed one aborts the caller. After the
//! window, anyone may execute the oldest finalized block, turning its sync transitions into real
//! strategy transfers and its queue entries into withdrawal credit.
//!
//! The ledger is single-threaded at the protocol level; all mutating operations are totally
//! ordered by the caller and take an explicit `now` where time matters, keeping every code path
//! deterministic.

pub mod block;
pub mod chain;
pub mod dispute;
pub mod errors;
pub mod prelude;
pub mod queues;
pub mod registry;
pub mod strategy;

pub use block::{BlockStatus, RollupBlock};
pub use chain::RollupLedger;
pub use dispute::{RevertedBlock, TransitionProof};
pub use errors::{DisputeError, LedgerError, RegistryError, StrategyError};
pub use registry::Registry;
pub use strategy::Strategy;
