//! The dispute resolver.
//!
//! A dispute names one committed transition, proves its inclusion (plus that of the transition
//! it chains from, in the same block or at the end of the predecessor block), proves the two
//! state leaves it touches against its claimed pre-state root, and asks the ledger to
//! re-evaluate the claim. A wrong claim reverts the whole block and reports the reason; a
//! correct claim aborts the call with [`DisputeError::FailedToDispute`] and changes nothing.
//!
//! Structural defects in the submitted proofs (unknown block, failed inclusion, non-adjacent
//! indices, inconsistent side roots) also abort: they prove nothing about the claim either way.

use l2y_rollup_evaluator::{evaluate, EvalContext};
use l2y_rollup_primitives::{
    AccountLeaf, BlockId, RevertReason, RollupEvent, StrategyLeaf, Timestamp, Transition,
};
use l2y_rollup_state_tree::{state_root, MerkleProof, StateProof};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{block::BlockStatus, chain::RollupLedger, errors::DisputeError};

/// An inclusion proof of one transition inside a committed block's transition list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionProof {
    /// The block the transition was committed in.
    pub block_id: BlockId,

    /// The full transition record at `proof.index` of that block.
    pub transition: Transition,

    /// The path of the transition's hash inside the block's transition tree.
    pub proof: MerkleProof,
}

/// The outcome of a successful dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertedBlock {
    /// The reverted block.
    pub block_id: BlockId,

    /// Why the disputed transition's claim was wrong.
    pub reason: RevertReason,
}

impl RollupLedger {
    /// Disputes one committed transition.
    ///
    /// `prev` is the transition the disputed one must chain from: the previous index of the
    /// same block, or the last transition of the latest surviving predecessor block when the
    /// disputed transition opens its block. It is omitted exactly when no such transition
    /// exists (the chain start, or a block re-anchored at genesis after every earlier block
    /// was reverted). `account_proof` and `strategy_proof` prove the touched leaves against
    /// the disputed transition's claimed pre-state root.
    ///
    /// On success the disputed block is reverted: its status flips, its intake entries return to
    /// `Pending`, its withdrawal commitments are discarded, and a
    /// [`RollupEvent::RollupBlockReverted`] is emitted. Later blocks are untouched and must be
    /// disputed separately if they too are invalid.
    pub fn dispute_transition(
        &mut self,
        prev: Option<&TransitionProof>,
        curr: &TransitionProof,
        account_proof: &StateProof<AccountLeaf>,
        strategy_proof: &StateProof<StrategyLeaf>,
        now: Timestamp,
    ) -> Result<RevertedBlock, DisputeError> {
        let block = self
            .block(curr.block_id)
            .ok_or(DisputeError::MalformedProof("unknown block"))?;
        if block.status != BlockStatus::Committed {
            return Err(DisputeError::BlockNotDisputable(curr.block_id));
        }
        if !block.in_challenge_window(now) {
            return Err(DisputeError::ChallengePeriodOver);
        }

        if curr.proof.index >= block.transition_count {
            return Err(DisputeError::MalformedProof("transition index out of range"));
        }
        if !curr.proof.verify(&curr.transition.hash(), &block.transition_root) {
            return Err(DisputeError::MalformedProof("transition not in block"));
        }

        let chain_start = curr.block_id == 0 && curr.proof.index == 0;
        if chain_start {
            if prev.is_some() {
                return Err(DisputeError::MalformedProof(
                    "chain start takes no predecessor",
                ));
            }
            return self.dispute_chain_start(curr);
        }

        let pre_root = curr.transition.pre_root();
        if curr.proof.index == 0 {
            // A block's first transition chains from the last transition of the latest
            // surviving predecessor block, or from genesis when none survives.
            match self.chained_predecessor(curr.block_id) {
                Some(pred) => {
                    let (pred_id, pred_root, pred_count) =
                        (pred.block_id, pred.transition_root, pred.transition_count);
                    let prev =
                        prev.ok_or(DisputeError::MalformedProof("missing predecessor proof"))?;
                    if prev.block_id != pred_id || prev.proof.index + 1 != pred_count {
                        return Err(DisputeError::MalformedProof(
                            "predecessor is not the prior block's last transition",
                        ));
                    }
                    if !prev.proof.verify(&prev.transition.hash(), &pred_root) {
                        return Err(DisputeError::MalformedProof("predecessor not in its block"));
                    }
                    // A chaining break is itself a wrong claim, not a malformed dispute.
                    if prev.transition.post_root() != pre_root {
                        return Ok(
                            self.revert_block(curr.block_id, RevertReason::InvalidPostStateRoot)
                        );
                    }
                }
                None => {
                    if prev.is_some() {
                        return Err(DisputeError::MalformedProof(
                            "no surviving predecessor block",
                        ));
                    }
                    if pre_root != self.genesis_root() {
                        return Ok(
                            self.revert_block(curr.block_id, RevertReason::InvalidPostStateRoot)
                        );
                    }
                }
            }
        } else {
            let prev = prev.ok_or(DisputeError::MalformedProof("missing predecessor proof"))?;
            if prev.block_id != curr.block_id || prev.proof.index + 1 != curr.proof.index {
                return Err(DisputeError::MalformedProof("transitions are not adjacent"));
            }
            if !prev.proof.verify(&prev.transition.hash(), &block.transition_root) {
                return Err(DisputeError::MalformedProof("predecessor not in its block"));
            }
            if prev.transition.post_root() != pre_root {
                return Ok(self.revert_block(curr.block_id, RevertReason::InvalidPostStateRoot));
            }
        }
        if account_proof.state_root() != pre_root || strategy_proof.state_root() != pre_root {
            return Err(DisputeError::MalformedProof(
                "state proof does not match pre-state root",
            ));
        }
        if account_proof.other_root != strategy_proof.tree_root()
            || strategy_proof.other_root != account_proof.tree_root()
        {
            return Err(DisputeError::MalformedProof("inconsistent side roots"));
        }
        if let Some(account_id) = curr.transition.account_id() {
            if account_proof.proof.index != u64::from(account_id) {
                return Err(DisputeError::MalformedProof("account proof index mismatch"));
            }
        }
        if let Some(strategy_id) = curr.transition.strategy_id() {
            if strategy_proof.proof.index != u64::from(strategy_id) {
                return Err(DisputeError::MalformedProof(
                    "strategy proof index mismatch",
                ));
            }
        }

        let ctx = EvalContext {
            chain_start: false,
            genesis_root: self.genesis_root(),
            strategy_asset: curr
                .transition
                .strategy_id()
                .and_then(|id| self.strategy_asset(id)),
        };
        let effect = match evaluate(&ctx, &curr.transition, &account_proof.leaf, &strategy_proof.leaf)
        {
            Ok(effect) => effect,
            Err(err) => {
                return Ok(self.revert_block(curr.block_id, err.revert_reason()));
            }
        };

        let derived_post = state_root(
            &account_proof.proof.compute_root(&effect.account.hash()),
            &strategy_proof.proof.compute_root(&effect.strategy.hash()),
        );
        if derived_post != curr.transition.post_root() {
            return Ok(self.revert_block(curr.block_id, RevertReason::InvalidPostStateRoot));
        }

        info!(block_id = curr.block_id, index = curr.proof.index, "dispute failed, claim holds");
        Err(DisputeError::FailedToDispute)
    }

    /// The chain's first transition has no predecessor and no pre-state to prove leaves
    /// against; it must be an `Init` over the designated genesis root on both sides.
    fn dispute_chain_start(&mut self, curr: &TransitionProof) -> Result<RevertedBlock, DisputeError> {
        let ctx = EvalContext {
            chain_start: true,
            genesis_root: self.genesis_root(),
            strategy_asset: None,
        };
        let account = AccountLeaf::default();
        let strategy = StrategyLeaf::default();
        if let Err(err) = evaluate(&ctx, &curr.transition, &account, &strategy) {
            return Ok(self.revert_block(curr.block_id, err.revert_reason()));
        }
        if curr.transition.post_root() != self.genesis_root() {
            return Ok(self.revert_block(curr.block_id, RevertReason::InvalidInitTransition));
        }

        info!(block_id = curr.block_id, "dispute failed, init claim holds");
        Err(DisputeError::FailedToDispute)
    }

    /// Reverts a block after a successful dispute. The block's intake entries return to
    /// `Pending` so a corrected block can re-include them; later blocks keep their status.
    fn revert_block(&mut self, block_id: BlockId, reason: RevertReason) -> RevertedBlock {
        if let Some(block) = self.block_mut(block_id) {
            block.status = BlockStatus::Reverted;
        }
        self.rewind_queues(block_id);

        warn!(block_id, %reason, "block reverted");
        self.emit(RollupEvent::RollupBlockReverted { block_id, reason });
        RevertedBlock { block_id, reason }
    }
}
