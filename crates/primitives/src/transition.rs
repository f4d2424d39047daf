//! The tagged transition record: one atomic, typed state change of the auxiliary ledger.
//!
//! Every variant carries the claimed pre- and post-state roots. The ledger commits to an ordered
//! list of these records per block without evaluating them; the evaluator and the dispute
//! resolver re-derive their effects on demand. The canonical encoding is borsh (the enum
//! discriminant doubles as the wire tag) and the transition's leaf hash in a block's transition
//! tree is sha256 over that encoding.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    auth::OwnerSig,
    types::{AccountAddress, AccountId, Amount, AssetId, Hash32, StrategyId, Timestamp},
};

/// One state-transition record of the rollup chain.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum Transition {
    /// The chain's first transition. Establishes the genesis state root.
    Init {
        /// Claimed state root before this transition; must equal the designated genesis root.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
    },

    /// Credits a previously queued deposit to the account's idle balance. Binds the address to
    /// its account id on the account's first appearance.
    Deposit {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The depositing owner.
        account: AccountAddress,
        /// The dense id the owner is (or becomes) bound to.
        account_id: AccountId,
        /// The deposited asset.
        asset_id: AssetId,
        /// The deposited amount.
        amount: Amount,
    },

    /// Debits idle balance and schedules a payout on the base ledger.
    Withdraw {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The withdrawing owner.
        account: AccountAddress,
        /// The owner's account id.
        account_id: AccountId,
        /// The withdrawn asset.
        asset_id: AssetId,
        /// The withdrawn amount.
        amount: Amount,
        /// Strictly increasing per-account authorization nonce.
        nonce: Timestamp,
        /// Owner authorization over `{account, asset_id, amount, nonce}`.
        signature: OwnerSig,
    },

    /// Moves idle balance into a strategy's st tokens at the strategy's current exchange rate.
    Commit {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The committing owner.
        account: AccountAddress,
        /// The owner's account id.
        account_id: AccountId,
        /// The target strategy.
        strategy_id: StrategyId,
        /// The committed asset amount.
        amount: Amount,
        /// Strictly increasing per-account authorization nonce.
        nonce: Timestamp,
        /// Owner authorization over `{account, strategy_id, amount, nonce}`.
        signature: OwnerSig,
    },

    /// Burns st tokens back into idle balance at the strategy's current exchange rate.
    Uncommit {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The uncommitting owner.
        account: AccountAddress,
        /// The owner's account id.
        account_id: AccountId,
        /// The source strategy.
        strategy_id: StrategyId,
        /// The burnt st token amount.
        st_token_amount: Amount,
        /// Strictly increasing per-account authorization nonce.
        nonce: Timestamp,
        /// Owner authorization over `{account, strategy_id, st_token_amount, nonce}`.
        signature: OwnerSig,
    },

    /// Operator transition netting all commit/uncommit value accumulated since the previous
    /// commitment sync for one strategy into a single pending transfer.
    SyncCommitment {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The synced strategy.
        strategy_id: StrategyId,
        /// The claimed pending commit bucket being netted; must match the strategy leaf.
        pending_commit_amount: Amount,
        /// The claimed pending uncommit bucket being netted; must match the strategy leaf.
        pending_uncommit_amount: Amount,
    },

    /// Records an externally observed balance delta (realized yield) for one strategy,
    /// consuming the oldest unconsumed balance-sync intake entry.
    SyncBalance {
        /// Claimed state root before this transition.
        pre_root: Hash32,
        /// Claimed state root after this transition.
        post_root: Hash32,
        /// The synced strategy.
        strategy_id: StrategyId,
        /// The externally observed balance delta.
        delta: Amount,
    },
}

/// The discriminant of a [`Transition`], for dispatch and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// [`Transition::Init`].
    Init,
    /// [`Transition::Deposit`].
    Deposit,
    /// [`Transition::Withdraw`].
    Withdraw,
    /// [`Transition::Commit`].
    Commit,
    /// [`Transition::Uncommit`].
    Uncommit,
    /// [`Transition::SyncCommitment`].
    SyncCommitment,
    /// [`Transition::SyncBalance`].
    SyncBalance,
}

impl Transition {
    /// The transition's kind.
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Init { .. } => TransitionKind::Init,
            Transition::Deposit { .. } => TransitionKind::Deposit,
            Transition::Withdraw { .. } => TransitionKind::Withdraw,
            Transition::Commit { .. } => TransitionKind::Commit,
            Transition::Uncommit { .. } => TransitionKind::Uncommit,
            Transition::SyncCommitment { .. } => TransitionKind::SyncCommitment,
            Transition::SyncBalance { .. } => TransitionKind::SyncBalance,
        }
    }

    /// The claimed state root before this transition.
    pub fn pre_root(&self) -> Hash32 {
        match self {
            Transition::Init { pre_root, .. }
            | Transition::Deposit { pre_root, .. }
            | Transition::Withdraw { pre_root, .. }
            | Transition::Commit { pre_root, .. }
            | Transition::Uncommit { pre_root, .. }
            | Transition::SyncCommitment { pre_root, .. }
            | Transition::SyncBalance { pre_root, .. } => *pre_root,
        }
    }

    /// The claimed state root after this transition.
    pub fn post_root(&self) -> Hash32 {
        match self {
            Transition::Init { post_root, .. }
            | Transition::Deposit { post_root, .. }
            | Transition::Withdraw { post_root, .. }
            | Transition::Commit { post_root, .. }
            | Transition::Uncommit { post_root, .. }
            | Transition::SyncCommitment { post_root, .. }
            | Transition::SyncBalance { post_root, .. } => *post_root,
        }
    }

    /// Overwrites the claimed post-state root. Intake bookkeeping never calls this; it exists so
    /// operators (and tests) can construct claims.
    pub fn set_post_root(&mut self, root: Hash32) {
        match self {
            Transition::Init { post_root, .. }
            | Transition::Deposit { post_root, .. }
            | Transition::Withdraw { post_root, .. }
            | Transition::Commit { post_root, .. }
            | Transition::Uncommit { post_root, .. }
            | Transition::SyncCommitment { post_root, .. }
            | Transition::SyncBalance { post_root, .. } => *post_root = root,
        }
    }

    /// The account id this transition touches, if it is an account transition.
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Transition::Deposit { account_id, .. }
            | Transition::Withdraw { account_id, .. }
            | Transition::Commit { account_id, .. }
            | Transition::Uncommit { account_id, .. } => Some(*account_id),
            _ => None,
        }
    }

    /// The strategy id this transition touches, if it is a strategy transition.
    pub fn strategy_id(&self) -> Option<StrategyId> {
        match self {
            Transition::Commit { strategy_id, .. }
            | Transition::Uncommit { strategy_id, .. }
            | Transition::SyncCommitment { strategy_id, .. }
            | Transition::SyncBalance { strategy_id, .. } => Some(*strategy_id),
            _ => None,
        }
    }

    /// Whether this transition must content-match an execution intent (commitment or balance
    /// sync) at execution time.
    pub fn is_sync(&self) -> bool {
        matches!(
            self,
            Transition::SyncCommitment { .. } | Transition::SyncBalance { .. }
        )
    }

    /// The canonical borsh encoding.
    pub fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).expect("transition encoding is infallible")
    }

    /// The transition's leaf hash in a block's transition tree.
    pub fn hash(&self) -> Hash32 {
        Hash32::digest(&self.encode())
    }
}

/// Why a block was reverted by a successful dispute.
///
/// A reverted block is a protocol-level *result*, not a fault of the caller, so these travel in
/// the [`RollupBlockReverted`](crate::RollupEvent::RollupBlockReverted) event rather than in an
/// error. Evaluator-internal failures surface coarse-grained as
/// [`RevertReason::FailedToEvaluate`] so evaluator internals do not leak into the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevertReason {
    /// An `Init` transition appeared outside the chain start, or its roots were wrong.
    InvalidInitTransition,

    /// A transition's claimed address↔id binding contradicts the proven account leaf.
    InvalidAccountId,

    /// The evaluator rejected the transition outright (bad signature, insufficient funds, ...).
    FailedToEvaluate,

    /// The evaluator accepted the transition but the recomputed root differs from the claim,
    /// or the claimed roots break the chain.
    InvalidPostStateRoot,
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            RevertReason::InvalidInitTransition => "invalid init transition",
            RevertReason::InvalidAccountId => "invalid account id",
            RevertReason::FailedToEvaluate => "failed to evaluate",
            RevertReason::InvalidPostStateRoot => "invalid post-state root",
        };
        write!(f, "{reason}")
    }
}
