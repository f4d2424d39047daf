//! Observable ledger events.
//!
//! The ledger appends these to an internal log (drainable by watchtowers and tests) and mirrors
//! them to `tracing`. A reverted block travels here rather than in an error because the
//! discovering party is not at fault.

use serde::{Deserialize, Serialize};

use crate::{
    transition::RevertReason,
    types::{AccountAddress, Amount, AssetId, BlockId},
};

/// One entry of the ledger's observable event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollupEvent {
    /// Assets were locked in and a deposit intake entry was queued.
    AssetDeposited {
        /// The depositing owner.
        account: AccountAddress,
        /// The deposited asset.
        asset_id: AssetId,
        /// The deposited amount.
        amount: Amount,
        /// The next block id at the time of intake, i.e. the earliest block that can include
        /// this deposit.
        block_id: BlockId,
    },

    /// A committed block was reverted by a successful dispute.
    RollupBlockReverted {
        /// The reverted block.
        block_id: BlockId,
        /// Why the dispute succeeded.
        reason: RevertReason,
    },

    /// A finalized block was executed and its queue entries cleared.
    RollupBlockExecuted {
        /// The executed block.
        block_id: BlockId,
    },
}
