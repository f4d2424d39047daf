//! Error types for the rollup ledger.
//!
//! Two channels are deliberately separated. Protocol-level invalidity discovered via dispute is
//! *not* an error: it is reported as a state change (block reverted, reason emitted) because the
//! discovering party is not at fault. Everything in this module is the other channel: misuse and
//! precondition violations that abort the triggering call with no state change.

use l2y_rollup_primitives::{AssetId, BlockId, StrategyId};
use l2y_rollup_state_tree::TreeError;
use thiserror::Error;

/// Errors from a strategy collaborator. Opaque to the ledger; carried through verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("strategy error: {0}")]
pub struct StrategyError(pub String);

/// Errors from the registry collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The zero address cannot be registered; id 0 is reserved for it.
    #[error("cannot register the zero address")]
    ZeroAddress,

    /// The address already holds an id; the bijection is fixed.
    #[error("address is already registered")]
    AlreadyRegistered,
}

/// Misuse and precondition violations on the ledger's mutating operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Intake is halted while the ledger is paused.
    #[error("ledger is paused")]
    Paused,

    /// The operation is only permitted while the ledger is paused.
    #[error("ledger is not paused")]
    NotPaused,

    /// The asset id is not registered.
    #[error("unknown asset id {0}")]
    UnknownAsset(AssetId),

    /// The strategy id is not registered or has no attached collaborator.
    #[error("unknown strategy id {0}")]
    UnknownStrategy(StrategyId),

    /// The strategy collaborator reports an asset address the registry does not know.
    #[error("strategy {0} is bound to an unregistered asset")]
    UnregisteredStrategyAsset(StrategyId),

    /// Accepting the deposit would push the asset's cumulative deposits past the configured
    /// limit.
    #[error("net deposit exceeds limit")]
    NetDepositLimitExceeded,

    /// No cleared withdrawal credit for this account and asset.
    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    /// `commit_block` requires the next sequence number, with no gaps and no reuse.
    #[error("out-of-sequence block id: expected {expected}, got {got}")]
    OutOfSequenceBlock {
        /// The next id the ledger will accept.
        expected: BlockId,
        /// The id the caller submitted.
        got: BlockId,
    },

    /// The block's first transition does not chain from the latest surviving claimed state
    /// root.
    #[error("block does not chain from the current state root")]
    UnchainedBlock,

    /// A block must carry at least one transition.
    #[error("empty transition list")]
    EmptyBlock,

    /// A deposit transition does not match the oldest pending deposit intake entry.
    #[error("invalid deposit transition, mismatch or wrong ordering")]
    DepositMismatch,

    /// A balance-sync transition does not consume the oldest pending balance-sync intake entry.
    #[error("invalid balance sync transition, mismatch or wrong ordering")]
    BalanceSyncMismatch,

    /// There is no committed, un-executed block.
    #[error("no executable block")]
    NoExecutableBlock,

    /// The oldest committed block is still inside its challenge window.
    #[error("Block challenge period is not over")]
    ChallengePeriodNotOver,

    /// The provided execution intents do not content-match the block's sync transitions.
    #[error("intents do not match the committed block")]
    IntentMismatch,

    /// A strategy collaborator failed during execution or balance intake.
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// State-tree parameters are unusable.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Aborts of a dispute call. A *successful* dispute is not an error; it returns the reverted
/// block. Disputing a valid transition is deliberately an expensive no-op for the disputer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisputeError {
    /// Everything verified and the transition is valid; there is nothing to revert.
    #[error("Failed to dispute")]
    FailedToDispute,

    /// The block's challenge window has elapsed; it is permanently final.
    #[error("Block challenge period is over")]
    ChallengePeriodOver,

    /// The block is already executed or reverted.
    #[error("block {0} cannot be disputed")]
    BlockNotDisputable(BlockId),

    /// The submitted proofs are structurally unusable (unknown block, non-adjacent indices,
    /// failed inclusion, inconsistent side roots).
    #[error("malformed dispute proof: {0}")]
    MalformedProof(&'static str),
}
