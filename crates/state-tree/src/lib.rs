//! # Rollup State Trees
//!
//! Fixed-depth sparse Merkle trees over the two state leaf kinds (account records and strategy
//! records), plus the flat Merkle tree over one block's transition list.
//!
//! The rollup's state root is `sha256(account_tree_root || strategy_tree_root)`. The ledger
//! itself never materializes these trees; it stores only per-block commitments. Operators keep a
//! full [`SparseMerkleTree`] per side to produce transitions and proofs, and the dispute resolver
//! re-derives roots from [`MerkleProof`]s alone, using
//! [`MerkleProof::compute_root`] with the post-transition leaf hash to obtain the post-update
//! root without ever holding a tree.

pub mod list;
pub mod proof;
pub mod tree;

pub use list::{transition_list_proof, transition_list_root};
pub use proof::{LeafNode, MerkleProof, StateProof};
pub use tree::{empty_root, state_root, SparseMerkleTree, TreeError};
