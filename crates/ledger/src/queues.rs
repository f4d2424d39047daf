//! Status-tracked intake queues.
//!
//! User-facing operations append typed entries here; `commit_block` flips the oldest pending
//! entries to `Included(block_id)` in strict FIFO order, a successful dispute flips them back to
//! `Pending`, and execution flips them to the terminal `Cleared`. Entries are append-only and
//! order-preserving. Note that a revert can leave pending entries *behind* entries still
//! included in a later block, so every operation walks statuses rather than trusting a cursor.

use l2y_rollup_primitives::{AccountAddress, Amount, AssetId, BlockId, StrategyId};
use serde::{Deserialize, Serialize};

/// Lifecycle of an intake entry. `Cleared` is terminal; `Included` reverts to `Pending` if the
/// owning block is reverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakeStatus {
    /// Queued, not yet covered by any committed block.
    Pending,

    /// Covered by the given committed block, awaiting execution.
    Included(BlockId),

    /// Executed. Terminal.
    Cleared,
}

/// One queue entry together with its lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeEntry<T> {
    /// The queued item.
    pub item: T,

    /// Where the item stands in the pending → included → cleared lifecycle.
    pub status: IntakeStatus,
}

/// An append-only, order-preserving queue of status-tracked intake entries.
#[derive(Debug, Clone, Default)]
pub struct IntakeQueue<T> {
    entries: Vec<IntakeEntry<T>>,
}

impl<T: Clone> IntakeQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a pending entry.
    pub fn push(&mut self, item: T) {
        self.entries.push(IntakeEntry {
            item,
            status: IntakeStatus::Pending,
        });
    }

    /// All entries, oldest first, with their statuses.
    pub fn entries(&self) -> &[IntakeEntry<T>] {
        &self.entries
    }

    /// The pending entries, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .filter(|e| e.status == IntakeStatus::Pending)
            .map(|e| &e.item)
    }

    /// The number of pending entries.
    pub fn pending_len(&self) -> usize {
        self.pending().count()
    }

    /// Flips the `count` oldest pending entries to `Included(block_id)`.
    ///
    /// Callers must have validated `count <= pending_len()` beforehand; inclusion is all-or-
    /// nothing at the commit level.
    pub fn include_front(&mut self, count: usize, block_id: BlockId) {
        debug_assert!(count <= self.pending_len());
        let mut remaining = count;
        for entry in &mut self.entries {
            if remaining == 0 {
                break;
            }
            if entry.status == IntakeStatus::Pending {
                entry.status = IntakeStatus::Included(block_id);
                remaining -= 1;
            }
        }
    }

    /// Returns the entries included in `block_id` to `Pending` (block reverted).
    pub fn revert_block(&mut self, block_id: BlockId) {
        for entry in &mut self.entries {
            if entry.status == IntakeStatus::Included(block_id) {
                entry.status = IntakeStatus::Pending;
            }
        }
    }

    /// Flips the entries included in `block_id` to `Cleared` and returns their items, oldest
    /// first (block executed).
    pub fn clear_block(&mut self, block_id: BlockId) -> Vec<T> {
        let mut cleared = Vec::new();
        for entry in &mut self.entries {
            if entry.status == IntakeStatus::Included(block_id) {
                entry.status = IntakeStatus::Cleared;
                cleared.push(entry.item.clone());
            }
        }
        cleared
    }
}

/// A queued deposit awaiting inclusion and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositIntake {
    /// The depositing owner.
    pub account: AccountAddress,

    /// The deposited asset.
    pub asset_id: AssetId,

    /// The deposited amount.
    pub amount: Amount,
}

/// A queued externally-observed strategy balance delta awaiting inclusion and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSyncIntake {
    /// The observed strategy.
    pub strategy_id: StrategyId,

    /// The balance delta since the previous sync.
    pub delta: Amount,
}

/// A withdrawal found in a committed block, payable once that block executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawCommit {
    /// The withdrawing owner.
    pub account: AccountAddress,

    /// The withdrawn asset.
    pub asset_id: AssetId,

    /// The withdrawn amount.
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(n: u64) -> IntakeQueue<u64> {
        let mut q = IntakeQueue::new();
        for i in 0..n {
            q.push(i);
        }
        q
    }

    #[test]
    fn inclusion_is_fifo() {
        let mut q = queue_with(4);
        q.include_front(2, 7);

        assert_eq!(q.pending().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(q.entries()[0].status, IntakeStatus::Included(7));
        assert_eq!(q.entries()[1].status, IntakeStatus::Included(7));
        assert_eq!(q.entries()[2].status, IntakeStatus::Pending);
    }

    #[test]
    fn revert_returns_entries_to_pending_in_order() {
        let mut q = queue_with(4);
        q.include_front(2, 0);
        q.include_front(1, 1);

        q.revert_block(0);
        assert_eq!(q.pending().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
        // Entry 2 stays included in block 1; block 1 was not reverted.
        assert_eq!(q.entries()[2].status, IntakeStatus::Included(1));

        // A later commit picks the reverted entries back up, oldest first.
        q.include_front(2, 2);
        assert_eq!(q.entries()[0].status, IntakeStatus::Included(2));
        assert_eq!(q.entries()[1].status, IntakeStatus::Included(2));
        assert_eq!(q.pending().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn clear_is_terminal() {
        let mut q = queue_with(3);
        q.include_front(2, 0);

        assert_eq!(q.clear_block(0), vec![0, 1]);
        q.revert_block(0);
        assert_eq!(q.entries()[0].status, IntakeStatus::Cleared);
        assert_eq!(q.entries()[1].status, IntakeStatus::Cleared);
        assert_eq!(q.pending().copied().collect::<Vec<_>>(), vec![2]);
    }
}
