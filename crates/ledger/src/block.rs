//! The per-block commitment record and its two-phase state machine.
//!
//! A block is created `Committed`, and ends `Executed` (its challenge window elapsed without a
//! successful dispute and someone replayed its effects) or `Reverted` (a dispute proved one of
//! its transitions wrong). Both end states are terminal. Finality is time-bounded, not
//! proof-bounded: once the window elapses the block is final even if a violation is found later.

use l2y_rollup_primitives::{BlockId, Hash32, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle of a committed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    /// Posted, inside or past its challenge window, not yet executed.
    Committed,

    /// Executed. Terminal.
    Executed,

    /// Reverted by a successful dispute. Terminal.
    Reverted,
}

/// The ledger's commitment to one posted block. The transition list itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupBlock {
    /// The block's sequence number.
    pub block_id: BlockId,

    /// Merkle root over the ordered transition list.
    pub transition_root: Hash32,

    /// Number of transitions committed under `transition_root`.
    pub transition_count: u64,

    /// Running hash over the block's sync transitions; execution intents must recompute it.
    pub intent_hash: Hash32,

    /// The claimed state root after the block's last transition. The next block must chain
    /// from it (or from an earlier surviving block's, once this one is reverted).
    pub final_root: Hash32,

    /// When the block was committed.
    pub commit_time: Timestamp,

    /// The challenge window applied to this block, snapshotted at commit time so a later admin
    /// change cannot move an existing deadline.
    pub challenge_period: u64,

    /// Where the block stands in the committed → executed | reverted machine.
    pub status: BlockStatus,
}

impl RollupBlock {
    /// The instant at which the block becomes final (first instant disputes are rejected).
    pub fn challenge_deadline(&self) -> Timestamp {
        self.commit_time.saturating_add(self.challenge_period)
    }

    /// Whether the block can still be disputed at `now`.
    pub fn in_challenge_window(&self, now: Timestamp) -> bool {
        now < self.challenge_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(commit_time: Timestamp, period: u64) -> RollupBlock {
        RollupBlock {
            block_id: 0,
            transition_root: Hash32::zero(),
            transition_count: 1,
            intent_hash: Hash32::zero(),
            final_root: Hash32::zero(),
            commit_time,
            challenge_period: period,
            status: BlockStatus::Committed,
        }
    }

    #[test]
    fn window_is_half_open() {
        let b = block(100, 10);
        assert!(b.in_challenge_window(100));
        assert!(b.in_challenge_window(109));
        assert!(!b.in_challenge_window(110));
    }

    #[test]
    fn zero_period_means_immediately_final() {
        let b = block(100, 0);
        assert!(!b.in_challenge_window(100));
    }
}
