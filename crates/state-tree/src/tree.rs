//! The sparse Merkle tree over one leaf kind, keyed by dense integer id.
//!
//! Only touched nodes are stored; every untouched subtree hashes to a per-level constant derived
//! from the leaf kind's empty-leaf hash. Updates are incremental: setting a leaf rewrites the
//! `depth` nodes on its path and nothing else. There are no parent/child pointers, only index
//! arithmetic (`index >> level` addresses the path node, `^ 1` its sibling).

use std::collections::HashMap;

use l2y_rollup_primitives::Hash32;
use thiserror::Error;

use crate::proof::MerkleProof;

/// Errors that can occur constructing or addressing a state tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// The requested depth cannot be addressed with 64-bit indices.
    #[error("tree depth {0} out of range (1..=63)")]
    DepthOutOfRange(u8),

    /// The leaf index does not fit the tree.
    #[error("leaf index {index} out of range for depth {depth}")]
    IndexOutOfRange {
        /// The offending index.
        index: u64,
        /// The tree's depth.
        depth: u8,
    },
}

/// Per-level hashes of completely empty subtrees: `empty[0]` is the empty-leaf hash, `empty[d]`
/// the root of an empty tree of depth `d`.
fn empty_levels(depth: u8, empty_leaf_hash: Hash32) -> Vec<Hash32> {
    let mut levels = Vec::with_capacity(depth as usize + 1);
    levels.push(empty_leaf_hash);
    for l in 0..depth as usize {
        let h = Hash32::combine(&levels[l], &levels[l]);
        levels.push(h);
    }
    levels
}

/// The root of an empty tree of the given depth over the given empty-leaf hash.
pub fn empty_root(depth: u8, empty_leaf_hash: Hash32) -> Hash32 {
    *empty_levels(depth, empty_leaf_hash)
        .last()
        .expect("levels are never empty")
}

/// The combined state root over the two side trees.
pub fn state_root(account_root: &Hash32, strategy_root: &Hash32) -> Hash32 {
    Hash32::combine(account_root, strategy_root)
}

/// A fixed-depth sparse Merkle tree over leaf hashes.
#[derive(Debug, Clone)]
pub struct SparseMerkleTree {
    depth: u8,
    empty: Vec<Hash32>,
    /// Materialized nodes, keyed by (level, index-within-level). Level 0 is the leaf level.
    nodes: HashMap<(u8, u64), Hash32>,
}

impl SparseMerkleTree {
    /// Creates an empty tree of `depth` levels over the given empty-leaf hash.
    pub fn new(depth: u8, empty_leaf_hash: Hash32) -> Result<Self, TreeError> {
        if depth == 0 || depth > 63 {
            return Err(TreeError::DepthOutOfRange(depth));
        }
        Ok(Self {
            depth,
            empty: empty_levels(depth, empty_leaf_hash),
            nodes: HashMap::new(),
        })
    }

    /// The tree's depth.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// The number of addressable leaves.
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    fn node(&self, level: u8, index: u64) -> Hash32 {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.empty[level as usize])
    }

    /// The current root.
    pub fn root(&self) -> Hash32 {
        self.node(self.depth, 0)
    }

    /// The current hash at a leaf position (the empty-leaf hash if never set).
    pub fn leaf(&self, index: u64) -> Result<Hash32, TreeError> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    /// Sets the leaf at `index` and rewrites the nodes on its path to the root.
    pub fn set(&mut self, index: u64, leaf_hash: Hash32) -> Result<(), TreeError> {
        self.check_index(index)?;

        self.nodes.insert((0, index), leaf_hash);
        let mut idx = index;
        let mut current = leaf_hash;
        for level in 0..self.depth {
            let sibling = self.node(level, idx ^ 1);
            current = if idx & 1 == 0 {
                Hash32::combine(&current, &sibling)
            } else {
                Hash32::combine(&sibling, &current)
            };
            idx >>= 1;
            self.nodes.insert((level + 1, idx), current);
        }
        Ok(())
    }

    /// The inclusion proof for the leaf at `index` against the current root.
    pub fn prove(&self, index: u64) -> Result<MerkleProof, TreeError> {
        self.check_index(index)?;

        let siblings = (0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect();
        Ok(MerkleProof { index, siblings })
    }

    fn check_index(&self, index: u64) -> Result<(), TreeError> {
        if index >= self.capacity() {
            return Err(TreeError::IndexOutOfRange {
                index,
                depth: self.depth,
            });
        }
        Ok(())
    }
}
