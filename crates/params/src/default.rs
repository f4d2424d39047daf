//! Fallback values for the rollup parameters.

use crate::rollup::TreeDepth;

/// Default depth of the account and strategy state trees (65,536 leaves each).
pub const TREE_DEPTH: TreeDepth = 16;

/// Default challenge window after a block commit, in seconds.
pub const BLOCK_CHALLENGE_PERIOD: u64 = 3_600;
