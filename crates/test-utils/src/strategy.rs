//! A scriptable in-memory strategy collaborator.

use std::sync::{Arc, Mutex};

use l2y_rollup_ledger::{Strategy, StrategyError};
use l2y_rollup_primitives::{Amount, ExternalAddress};

#[derive(Debug, Default)]
struct StrategyState {
    balance: Amount,
    harvest_yield: Amount,
    commits: Vec<Amount>,
    uncommits: Vec<Amount>,
}

/// An in-memory [`Strategy`] tracking its balance as plain arithmetic and recording every
/// aggregate transfer.
///
/// The inner state sits behind a shared handle: clone the strategy before boxing it into the
/// ledger and the clone can simulate yield ([`DummyStrategy::accrue`]) and inspect transfers
/// while the ledger owns the collaborator.
#[derive(Debug, Clone)]
pub struct DummyStrategy {
    asset: ExternalAddress,
    state: Arc<Mutex<StrategyState>>,
}

impl DummyStrategy {
    /// Creates a strategy over the given asset with a zero balance.
    pub fn new(asset: ExternalAddress) -> Self {
        Self {
            asset,
            state: Arc::new(Mutex::new(StrategyState::default())),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StrategyState> {
        self.state.lock().expect("strategy state lock")
    }

    /// Simulates externally realized yield.
    pub fn accrue(&self, amount: Amount) {
        self.state().balance += amount;
    }

    /// Sets the amount each `harvest` call accrues.
    pub fn set_harvest_yield(&self, amount: Amount) {
        self.state().harvest_yield = amount;
    }

    /// Every `aggregate_commit` amount so far, in call order.
    pub fn commits(&self) -> Vec<Amount> {
        self.state().commits.clone()
    }

    /// Every `aggregate_uncommit` amount so far, in call order.
    pub fn uncommits(&self) -> Vec<Amount> {
        self.state().uncommits.clone()
    }
}

impl Strategy for DummyStrategy {
    fn asset_address(&self) -> ExternalAddress {
        self.asset
    }

    fn balance(&self) -> Amount {
        self.state().balance
    }

    fn sync_balance(&mut self) -> Result<Amount, StrategyError> {
        Ok(self.state().balance)
    }

    fn aggregate_commit(&mut self, amount: Amount) -> Result<(), StrategyError> {
        let mut state = self.state();
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or_else(|| StrategyError("strategy balance overflow".to_owned()))?;
        state.commits.push(amount);
        Ok(())
    }

    fn aggregate_uncommit(&mut self, amount: Amount) -> Result<(), StrategyError> {
        let mut state = self.state();
        state.balance = state
            .balance
            .checked_sub(amount)
            .ok_or_else(|| StrategyError("insufficient strategy balance".to_owned()))?;
        state.uncommits.push(amount);
        Ok(())
    }

    fn harvest(&mut self) -> Result<(), StrategyError> {
        let mut state = self.state();
        state.balance = state
            .balance
            .checked_add(state.harvest_yield)
            .ok_or_else(|| StrategyError("strategy balance overflow".to_owned()))?;
        Ok(())
    }
}
