//! Evaluator rejections and their mapping onto audit-trail revert reasons.

use l2y_rollup_primitives::{auth::AuthError, RevertReason};
use thiserror::Error;

/// Ways the evaluator can reject a transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    /// An `Init` transition appeared outside the chain start, a non-`Init` transition appeared
    /// at the chain start, or the init's pre-root is not the genesis root.
    #[error("invalid init transition")]
    InvalidInitTransition,

    /// A deposit's claimed address↔id binding contradicts the proven account leaf.
    #[error("invalid account id")]
    InvalidAccountId,

    /// The transition references an account leaf bound to a different owner.
    #[error("transition does not match the bound account")]
    AccountMismatch,

    /// The owner authorization did not verify.
    #[error("owner authorization rejected: {0}")]
    BadAuthorization(#[from] AuthError),

    /// The authorization nonce does not advance the account's last-consumed nonce.
    #[error("authorization nonce is not newer than the account's")]
    StaleNonce,

    /// Not enough idle balance for a withdraw or commit.
    #[error("insufficient idle balance")]
    InsufficientIdleBalance,

    /// Not enough st tokens for an uncommit.
    #[error("insufficient st tokens")]
    InsufficientStTokens,

    /// A strategy transition names a strategy the registry has no asset binding for, or an
    /// asset binding that contradicts the proven strategy leaf.
    #[error("unknown or mismatched strategy asset")]
    StrategyAssetMismatch,

    /// A commitment sync's claimed pending buckets do not match the strategy leaf.
    #[error("pending commitment buckets do not match the claim")]
    PendingMismatch,

    /// Balance arithmetic overflowed.
    #[error("balance arithmetic overflow")]
    Overflow,
}

impl EvalError {
    /// The coarse revert reason this rejection surfaces as when a dispute succeeds on it.
    pub fn revert_reason(&self) -> RevertReason {
        match self {
            EvalError::InvalidInitTransition => RevertReason::InvalidInitTransition,
            EvalError::InvalidAccountId => RevertReason::InvalidAccountId,
            _ => RevertReason::FailedToEvaluate,
        }
    }
}
