//! Test utilities for the rollup workspace: deterministic owner keys, an honest operator-side
//! block builder with full shadow state trees, a scriptable strategy collaborator, and logging
//! setup for integration tests.

pub mod builder;
pub mod keys;
pub mod logging;
pub mod strategy;

pub use builder::{transition_proofs, BlockBuilder};
pub use keys::OwnerKey;
pub use strategy::DummyStrategy;
