//! Parameters for the rollup ledger such as the state-tree depth and the block challenge period.

use serde::{Deserialize, Serialize};

use crate::default::{BLOCK_CHALLENGE_PERIOD, TREE_DEPTH};

/// Depth of a state tree, i.e. the number of sibling hashes in an inclusion proof.
pub type TreeDepth = u8;

/// The rollup public parameters. Every participant must evaluate disputes and deadlines against
/// the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupParams {
    /// Depth of the account and strategy state trees. Account and strategy ids must fit in
    /// `2^tree_depth` leaves.
    pub tree_depth: TreeDepth,

    /// Fixed window after a block's commit time during which it may be disputed, in seconds.
    /// Admin-adjustable at runtime for blocks committed after the change.
    pub block_challenge_period: u64,
}

impl Default for RollupParams {
    fn default() -> Self {
        Self {
            tree_depth: TREE_DEPTH,
            block_challenge_period: BLOCK_CHALLENGE_PERIOD,
        }
    }
}
