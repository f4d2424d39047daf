//! Inclusion proofs.
//!
//! A [`MerkleProof`] carries a leaf index and the sibling hashes up to a root; it verifies a leaf
//! against a root, and -- equally important for disputes -- recomputes the root that results from
//! substituting a *different* leaf at the same position. A [`StateProof`] wraps a decoded state
//! leaf together with the root of the opposite side tree, tying the leaf to a combined state
//! root.

use l2y_rollup_primitives::{AccountLeaf, Hash32, StrategyLeaf};
use serde::{Deserialize, Serialize};

use crate::tree::state_root;

/// An inclusion path from a leaf position to a tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The leaf position.
    pub index: u64,

    /// Sibling hashes, leaf level first.
    pub siblings: Vec<Hash32>,
}

impl MerkleProof {
    /// The root obtained by placing `leaf_hash` at this proof's position.
    pub fn compute_root(&self, leaf_hash: &Hash32) -> Hash32 {
        let mut current = *leaf_hash;
        let mut idx = self.index;
        for sibling in &self.siblings {
            current = if idx & 1 == 0 {
                Hash32::combine(&current, sibling)
            } else {
                Hash32::combine(sibling, &current)
            };
            idx >>= 1;
        }
        current
    }

    /// Whether this proof places `leaf_hash` under `root`.
    pub fn verify(&self, leaf_hash: &Hash32, root: &Hash32) -> bool {
        self.compute_root(leaf_hash) == *root
    }
}

/// A state leaf that knows its own hash. Implemented for the two leaf kinds of the state tree.
pub trait LeafNode {
    /// The leaf hash entering the tree.
    fn leaf_hash(&self) -> Hash32;

    /// Combines this side's tree root with the opposite side's into the state root. The account
    /// tree hashes first.
    fn to_state_root(own_root: &Hash32, other_root: &Hash32) -> Hash32;
}

impl LeafNode for AccountLeaf {
    fn leaf_hash(&self) -> Hash32 {
        self.hash()
    }

    fn to_state_root(own_root: &Hash32, other_root: &Hash32) -> Hash32 {
        state_root(own_root, other_root)
    }
}

impl LeafNode for StrategyLeaf {
    fn leaf_hash(&self) -> Hash32 {
        self.hash()
    }

    fn to_state_root(own_root: &Hash32, other_root: &Hash32) -> Hash32 {
        state_root(other_root, own_root)
    }
}

/// An inclusion proof of one decoded state leaf against a combined state root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateProof<L> {
    /// The decoded leaf at `proof.index`.
    pub leaf: L,

    /// The root of the opposite side tree at the same state.
    pub other_root: Hash32,

    /// The path of `leaf` inside its own side tree.
    pub proof: MerkleProof,
}

impl<L: LeafNode> StateProof<L> {
    /// This side's tree root as proven.
    pub fn tree_root(&self) -> Hash32 {
        self.proof.compute_root(&self.leaf.leaf_hash())
    }

    /// The combined state root this proof commits to.
    pub fn state_root(&self) -> Hash32 {
        L::to_state_root(&self.tree_root(), &self.other_root)
    }

    /// The combined state root after substituting `new_leaf` at this proof's position, with the
    /// opposite side's root replaced by `new_other_root`.
    pub fn updated_state_root(&self, new_leaf: &L, new_other_root: &Hash32) -> Hash32 {
        let own = self.proof.compute_root(&new_leaf.leaf_hash());
        L::to_state_root(&own, new_other_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::SparseMerkleTree;

    #[test]
    fn state_proof_commits_to_both_sides() {
        let mut accounts = SparseMerkleTree::new(4, AccountLeaf::default().hash()).unwrap();
        let strategies = SparseMerkleTree::new(4, StrategyLeaf::default().hash()).unwrap();

        let mut leaf = AccountLeaf {
            account_id: 2,
            ..Default::default()
        };
        *leaf.idle_slot(1) = 100;
        accounts.set(2, leaf.hash()).unwrap();

        let sp = StateProof {
            leaf: leaf.clone(),
            other_root: strategies.root(),
            proof: accounts.prove(2).unwrap(),
        };

        assert_eq!(
            sp.state_root(),
            state_root(&accounts.root(), &strategies.root())
        );

        // Substituting an updated leaf predicts the post-update state root.
        let mut updated = leaf;
        *updated.idle_slot(1) = 250;
        let predicted = sp.updated_state_root(&updated, &strategies.root());
        accounts.set(2, updated.hash()).unwrap();
        assert_eq!(
            predicted,
            state_root(&accounts.root(), &strategies.root())
        );
    }

    #[test]
    fn strategy_side_hashes_second() {
        let accounts = SparseMerkleTree::new(4, AccountLeaf::default().hash()).unwrap();
        let mut strategies = SparseMerkleTree::new(4, StrategyLeaf::default().hash()).unwrap();

        let leaf = StrategyLeaf {
            asset_id: 1,
            asset_balance: 10,
            ..Default::default()
        };
        strategies.set(1, leaf.hash()).unwrap();

        let sp = StateProof {
            leaf,
            other_root: accounts.root(),
            proof: strategies.prove(1).unwrap(),
        };

        assert_eq!(
            sp.state_root(),
            state_root(&accounts.root(), &strategies.root())
        );
    }
}
