//! Just import this if you want a no-brainer `use` statement to get the most of the ledger
//! crate.

pub use crate::{
    block::{BlockStatus, RollupBlock},
    chain::RollupLedger,
    dispute::{RevertedBlock, TransitionProof},
    errors::{DisputeError, LedgerError, RegistryError, StrategyError},
    queues::{BalanceSyncIntake, DepositIntake, IntakeStatus, WithdrawCommit},
    registry::Registry,
    strategy::Strategy,
};
