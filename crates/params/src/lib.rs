//! This crate contains the consensus-critical parameters that dictate the behavior of the rollup
//! ledger in a way that ensures all participants (committer, disputers, executors) agree on the
//! shape of the state trees and on the dispute deadline arithmetic.

pub mod default;
pub mod rollup;

pub use rollup::RollupParams;
