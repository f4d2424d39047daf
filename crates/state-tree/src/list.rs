//! The flat Merkle tree over one block's transition list.
//!
//! The ledger stores only this root per block; disputes prove individual transitions back into
//! it. Leaf ordering is the block's transition ordering; the list is padded with the zero hash to
//! the next power of two.

use l2y_rollup_primitives::Hash32;

use crate::{proof::MerkleProof, tree::TreeError};

fn padded_len(len: usize) -> usize {
    len.next_power_of_two().max(1)
}

fn build_levels(leaf_hashes: &[Hash32]) -> Vec<Vec<Hash32>> {
    let mut level: Vec<Hash32> = leaf_hashes.to_vec();
    level.resize(padded_len(leaf_hashes.len()), Hash32::zero());

    let mut levels = vec![level];
    while levels.last().expect("never empty").len() > 1 {
        let prev = levels.last().expect("never empty");
        let next = prev
            .chunks(2)
            .map(|pair| Hash32::combine(&pair[0], &pair[1]))
            .collect();
        levels.push(next);
    }
    levels
}

/// The Merkle root over an ordered transition list (given as leaf hashes).
pub fn transition_list_root(leaf_hashes: &[Hash32]) -> Hash32 {
    build_levels(leaf_hashes)
        .last()
        .expect("never empty")
        .first()
        .copied()
        .expect("root level has one node")
}

/// The inclusion proof for the transition at `index` against [`transition_list_root`].
pub fn transition_list_proof(leaf_hashes: &[Hash32], index: u64) -> Result<MerkleProof, TreeError> {
    let padded = padded_len(leaf_hashes.len()) as u64;
    if index >= leaf_hashes.len() as u64 {
        return Err(TreeError::IndexOutOfRange {
            index,
            depth: padded.trailing_zeros() as u8,
        });
    }

    let levels = build_levels(leaf_hashes);
    let mut siblings = Vec::with_capacity(levels.len() - 1);
    let mut idx = index as usize;
    for level in &levels[..levels.len() - 1] {
        siblings.push(level[idx ^ 1]);
        idx >>= 1;
    }
    Ok(MerkleProof { index, siblings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u64) -> Vec<Hash32> {
        (0..n).map(|i| Hash32::digest(&i.to_le_bytes())).collect()
    }

    #[test]
    fn single_leaf_list_is_its_own_root() {
        let l = leaves(1);
        assert_eq!(transition_list_root(&l), l[0]);
        let proof = transition_list_proof(&l, 0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(proof.verify(&l[0], &l[0]));
    }

    #[test]
    fn every_index_proves_into_the_root() {
        for n in [2u64, 3, 4, 5, 8, 13] {
            let l = leaves(n);
            let root = transition_list_root(&l);
            for i in 0..n {
                let proof = transition_list_proof(&l, i).unwrap();
                assert!(proof.verify(&l[i as usize], &root), "n={n} i={i}");
            }
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let l = leaves(4);
        assert!(transition_list_proof(&l, 4).is_err());
    }

    #[test]
    fn padding_does_not_collide_with_content() {
        // A list of 3 and the same list explicitly padded with the zero hash share a root, but
        // a different third element changes it.
        let mut l = leaves(3);
        let root = transition_list_root(&l);
        l.push(Hash32::zero());
        assert_eq!(transition_list_root(&l), root);

        let mut other = leaves(3);
        other[2] = Hash32::digest(b"swapped");
        assert_ne!(transition_list_root(&other), root);
    }
}
