//! The yield-strategy collaborator interface.
//!
//! How a strategy generates yield is none of the ledger's business; it only moves value in and
//! out and asks for the current balance. Collaborators are touched exclusively from
//! [`execute_block`](crate::RollupLedger::execute_block) and the balance-sync intake, never from
//! commit or dispute handling.

use l2y_rollup_primitives::{Amount, ExternalAddress};

use crate::errors::StrategyError;

/// One external yield strategy custodying a share of committed assets.
pub trait Strategy: std::fmt::Debug {
    /// The address of the asset this strategy accepts.
    fn asset_address(&self) -> ExternalAddress;

    /// The asset balance currently attributed to this strategy.
    fn balance(&self) -> Amount;

    /// Refreshes and reports the balance. May mutate (harvest-then-report).
    fn sync_balance(&mut self) -> Result<Amount, StrategyError>;

    /// Pulls `amount` of the asset from the ledger into the strategy.
    fn aggregate_commit(&mut self, amount: Amount) -> Result<(), StrategyError>;

    /// Pushes `amount` of the asset from the strategy back to the ledger.
    fn aggregate_uncommit(&mut self, amount: Amount) -> Result<(), StrategyError>;

    /// Realizes external yield into more of the base asset.
    fn harvest(&mut self) -> Result<(), StrategyError>;
}
