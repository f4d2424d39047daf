//! The rollup ledger orchestrator.
//!
//! Owns the intake queues, the append-only block-commitment list, the challenge clock and
//! execution. Commits are optimistic: the ledger never evaluates transitions, it only checks
//! them structurally against its own queues and stores a commitment; evaluation happens lazily,
//! in disputes.

use std::collections::HashMap;

use l2y_rollup_params::RollupParams;
use l2y_rollup_primitives::{
    AccountAddress, AccountLeaf, Amount, AssetId, BlockId, Hash32, RollupEvent, StrategyId,
    StrategyLeaf, Timestamp, Transition,
};
use l2y_rollup_state_tree::{empty_root, state_root, transition_list_root};
use tracing::{debug, info, warn};

use crate::{
    block::{BlockStatus, RollupBlock},
    errors::{LedgerError, StrategyError},
    queues::{BalanceSyncIntake, DepositIntake, IntakeEntry, IntakeQueue, WithdrawCommit},
    registry::Registry,
    strategy::Strategy,
};

/// Folds one sync transition into a block's running intent hash.
pub(crate) fn fold_intent_hash(acc: &Hash32, transition: &Transition) -> Hash32 {
    Hash32::combine(acc, &transition.hash())
}

/// The custodial rollup ledger.
#[derive(Debug)]
pub struct RollupLedger {
    params: RollupParams,
    registry: Registry,

    strategies: HashMap<StrategyId, Box<dyn Strategy>>,
    strategy_assets: HashMap<StrategyId, AssetId>,
    last_strategy_balances: HashMap<StrategyId, Amount>,

    blocks: Vec<RollupBlock>,
    /// Index of the oldest block not yet executed (reverted blocks are skipped past).
    next_execute: usize,

    deposits: IntakeQueue<DepositIntake>,
    balance_syncs: IntakeQueue<BalanceSyncIntake>,
    withdraw_commits: HashMap<BlockId, Vec<WithdrawCommit>>,
    pending_withdraws: HashMap<(AccountAddress, AssetId), Amount>,

    net_deposits: HashMap<AssetId, Amount>,
    net_deposit_limits: HashMap<AssetId, Amount>,

    challenge_period: u64,
    paused: bool,

    genesis_root: Hash32,
    events: Vec<RollupEvent>,
}

impl RollupLedger {
    /// Creates a ledger over the given parameters and registry.
    pub fn new(params: RollupParams, registry: Registry) -> Result<Self, LedgerError> {
        if params.tree_depth == 0 || params.tree_depth > 63 {
            return Err(l2y_rollup_state_tree::TreeError::DepthOutOfRange(params.tree_depth).into());
        }
        let genesis_root = state_root(
            &empty_root(params.tree_depth, AccountLeaf::default().hash()),
            &empty_root(params.tree_depth, StrategyLeaf::default().hash()),
        );

        Ok(Self {
            challenge_period: params.block_challenge_period,
            params,
            registry,
            strategies: HashMap::new(),
            strategy_assets: HashMap::new(),
            last_strategy_balances: HashMap::new(),
            blocks: Vec::new(),
            next_execute: 0,
            deposits: IntakeQueue::new(),
            balance_syncs: IntakeQueue::new(),
            withdraw_commits: HashMap::new(),
            pending_withdraws: HashMap::new(),
            net_deposits: HashMap::new(),
            net_deposit_limits: HashMap::new(),
            paused: false,
            genesis_root,
            events: Vec::new(),
        })
    }

    /// The ledger's parameters.
    pub fn params(&self) -> &RollupParams {
        &self.params
    }

    /// The registry collaborator (read-only).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The designated genesis state root (two empty trees).
    pub fn genesis_root(&self) -> Hash32 {
        self.genesis_root
    }

    /// The sequence number `commit_block` will accept next.
    pub fn next_block_id(&self) -> BlockId {
        self.blocks.len() as BlockId
    }

    /// All block commitments, oldest first.
    pub fn blocks(&self) -> &[RollupBlock] {
        &self.blocks
    }

    /// One block commitment.
    pub fn block(&self, block_id: BlockId) -> Option<&RollupBlock> {
        self.blocks.get(block_id as usize)
    }

    /// The claimed state root the next committed block must chain from: the final root of the
    /// latest surviving block, or genesis when none survives.
    pub fn chain_tip_root(&self) -> Hash32 {
        self.blocks
            .iter()
            .rev()
            .find(|block| block.status != BlockStatus::Reverted)
            .map(|block| block.final_root)
            .unwrap_or(self.genesis_root)
    }

    /// The latest surviving block before `block_id`, whose last transition the block's first
    /// transition must chain from.
    pub(crate) fn chained_predecessor(&self, block_id: BlockId) -> Option<&RollupBlock> {
        self.blocks[..block_id as usize]
            .iter()
            .rev()
            .find(|block| block.status != BlockStatus::Reverted)
    }

    /// The deposit intake queue, oldest first.
    pub fn pending_deposits(&self) -> &[IntakeEntry<DepositIntake>] {
        self.deposits.entries()
    }

    /// The balance-sync intake queue, oldest first.
    pub fn pending_balance_syncs(&self) -> &[IntakeEntry<BalanceSyncIntake>] {
        self.balance_syncs.entries()
    }

    /// The withdrawal commitments of a committed, not-yet-executed block.
    pub fn pending_withdraw_commits(&self, block_id: BlockId) -> &[WithdrawCommit] {
        self.withdraw_commits
            .get(&block_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The withdrawal credit currently payable to an account.
    pub fn pending_withdrawal(&self, account: &AccountAddress, asset_id: AssetId) -> Amount {
        self.pending_withdraws
            .get(&(*account, asset_id))
            .copied()
            .unwrap_or(0)
    }

    /// An attached strategy collaborator (read-only).
    pub fn strategy(&self, strategy_id: StrategyId) -> Option<&dyn Strategy> {
        self.strategies.get(&strategy_id).map(|s| &**s)
    }

    /// The asset the registry binds to an attached strategy.
    pub(crate) fn strategy_asset(&self, strategy_id: StrategyId) -> Option<AssetId> {
        self.strategy_assets.get(&strategy_id).copied()
    }

    /// Drains and returns the observable event log.
    pub fn take_events(&mut self) -> Vec<RollupEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: RollupEvent) {
        self.events.push(event);
    }

    /// Attaches a strategy collaborator under its registered id. The strategy's asset must
    /// itself be registered; the binding is recorded here so disputes never have to touch the
    /// collaborator.
    pub fn attach_strategy(
        &mut self,
        strategy_id: StrategyId,
        strategy: Box<dyn Strategy>,
    ) -> Result<(), LedgerError> {
        if self.registry.strategy_index_to_address(strategy_id).is_none() {
            return Err(LedgerError::UnknownStrategy(strategy_id));
        }
        let asset_id = self
            .registry
            .asset_address_to_index(&strategy.asset_address())
            .ok_or(LedgerError::UnregisteredStrategyAsset(strategy_id))?;

        self.strategy_assets.insert(strategy_id, asset_id);
        self.strategies.insert(strategy_id, strategy);
        Ok(())
    }

    /// Locks `amount` of an asset in and queues a pending deposit intake entry.
    pub fn deposit(
        &mut self,
        account: AccountAddress,
        asset_id: AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        if self.registry.asset_index_to_address(asset_id).is_none() {
            return Err(LedgerError::UnknownAsset(asset_id));
        }

        let total = self.net_deposits.get(&asset_id).copied().unwrap_or(0);
        let limit = self.net_deposit_limits.get(&asset_id).copied().unwrap_or(0);
        let new_total = total
            .checked_add(amount)
            .ok_or(LedgerError::NetDepositLimitExceeded)?;
        if new_total > limit {
            return Err(LedgerError::NetDepositLimitExceeded);
        }
        self.net_deposits.insert(asset_id, new_total);

        self.deposits.push(DepositIntake {
            account,
            asset_id,
            amount,
        });
        let block_id = self.next_block_id();
        info!(%account, asset_id, amount, block_id, "asset deposited");
        self.emit(RollupEvent::AssetDeposited {
            account,
            asset_id,
            amount,
            block_id,
        });
        Ok(())
    }

    /// Pays out the accumulated withdrawal credit for `account` in `asset_id`.
    pub fn withdraw(
        &mut self,
        account: &AccountAddress,
        asset_id: AssetId,
    ) -> Result<Amount, LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        let amount = self
            .pending_withdraws
            .remove(&(*account, asset_id))
            .filter(|amount| *amount > 0)
            .ok_or(LedgerError::NothingToWithdraw)?;

        // Withdrawals free up net-deposit headroom.
        let total = self.net_deposits.entry(asset_id).or_insert(0);
        *total = total.saturating_sub(amount);

        info!(%account, asset_id, amount, "withdrawal paid out");
        Ok(amount)
    }

    /// Queries the strategy collaborator's balance and queues the delta since the last sync as
    /// a pending balance-sync intake entry.
    pub fn sync_balance(&mut self, strategy_id: StrategyId) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        let strategy = self
            .strategies
            .get_mut(&strategy_id)
            .ok_or(LedgerError::UnknownStrategy(strategy_id))?;

        let current = strategy.sync_balance()?;
        let last = self
            .last_strategy_balances
            .get(&strategy_id)
            .copied()
            .unwrap_or(0);
        let delta = current
            .checked_sub(last)
            .ok_or_else(|| StrategyError("strategy balance decreased".to_owned()))?;
        self.last_strategy_balances.insert(strategy_id, current);

        debug!(strategy_id, delta, "balance sync queued");
        self.balance_syncs.push(BalanceSyncIntake { strategy_id, delta });
        Ok(())
    }

    /// Commits one block: stores the commitment to the ordered transition list and marks the
    /// subsumed pending intake entries `Included(block_id)`. The block's first transition must
    /// chain from [`chain_tip_root`](Self::chain_tip_root); no transition is evaluated.
    pub fn commit_block(
        &mut self,
        block_id: BlockId,
        transitions: &[Transition],
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let expected = self.next_block_id();
        if block_id != expected {
            return Err(LedgerError::OutOfSequenceBlock {
                expected,
                got: block_id,
            });
        }
        if transitions.is_empty() {
            return Err(LedgerError::EmptyBlock);
        }
        // Block boundaries chain eagerly: a commit claiming any pre-state other than the
        // current tip is rejected outright. Interior chaining stays lazy, checked in disputes.
        if transitions[0].pre_root() != self.chain_tip_root() {
            return Err(LedgerError::UnchainedBlock);
        }

        // First pass: validate against the queues without mutating, so a rejected commit leaves
        // no trace.
        let mut deposit_count = 0usize;
        let mut sync_count = 0usize;
        let mut withdraws = Vec::new();
        let mut intent_hash = Hash32::zero();
        {
            let mut next_deposit = self.deposits.pending();
            let mut next_sync = self.balance_syncs.pending();
            for (index, transition) in transitions.iter().enumerate() {
                match transition {
                    Transition::Deposit {
                        account,
                        asset_id,
                        amount,
                        ..
                    } => {
                        let queued = next_deposit.next().ok_or(LedgerError::DepositMismatch)?;
                        if queued.account != *account
                            || queued.asset_id != *asset_id
                            || queued.amount != *amount
                        {
                            return Err(LedgerError::DepositMismatch);
                        }
                        deposit_count += 1;
                    }
                    Transition::Withdraw {
                        account,
                        asset_id,
                        amount,
                        ..
                    } => {
                        withdraws.push(WithdrawCommit {
                            account: *account,
                            asset_id: *asset_id,
                            amount: *amount,
                        });
                    }
                    Transition::SyncBalance {
                        strategy_id, delta, ..
                    } => {
                        let queued = next_sync.next().ok_or(LedgerError::BalanceSyncMismatch)?;
                        if queued.strategy_id != *strategy_id || queued.delta != *delta {
                            return Err(LedgerError::BalanceSyncMismatch);
                        }
                        sync_count += 1;
                    }
                    Transition::Init { .. }
                    | Transition::Commit { .. }
                    | Transition::Uncommit { .. }
                    | Transition::SyncCommitment { .. } => {}
                }
                if transition.is_sync() {
                    intent_hash = fold_intent_hash(&intent_hash, transition);
                }
                debug!(block_id, index, kind = ?transition.kind(), "transition accepted");
            }
        }

        self.deposits.include_front(deposit_count, block_id);
        self.balance_syncs.include_front(sync_count, block_id);
        if !withdraws.is_empty() {
            self.withdraw_commits.insert(block_id, withdraws);
        }

        let leaf_hashes: Vec<Hash32> = transitions.iter().map(Transition::hash).collect();
        let block = RollupBlock {
            block_id,
            transition_root: transition_list_root(&leaf_hashes),
            transition_count: transitions.len() as u64,
            intent_hash,
            final_root: transitions[transitions.len() - 1].post_root(),
            commit_time: now,
            challenge_period: self.challenge_period,
            status: BlockStatus::Committed,
        };
        info!(
            block_id,
            transitions = block.transition_count,
            root = %block.transition_root,
            "block committed"
        );
        self.blocks.push(block);
        Ok(())
    }

    /// Executes the oldest committed block whose challenge window has elapsed, replaying its
    /// queue entries into real fund movement and withdrawal credit. `intents` must re-supply
    /// the block's sync transitions verbatim.
    pub fn execute_block(
        &mut self,
        intents: &[Transition],
        now: Timestamp,
    ) -> Result<BlockId, LedgerError> {
        // Reverted blocks are terminal no-ops for execution.
        while matches!(
            self.blocks.get(self.next_execute).map(|b| b.status),
            Some(BlockStatus::Reverted)
        ) {
            self.next_execute += 1;
        }
        let block = self
            .blocks
            .get(self.next_execute)
            .ok_or(LedgerError::NoExecutableBlock)?;
        let block_id = block.block_id;

        if block.in_challenge_window(now) {
            return Err(LedgerError::ChallengePeriodNotOver);
        }

        let mut intent_hash = Hash32::zero();
        for intent in intents {
            intent_hash = fold_intent_hash(&intent_hash, intent);
        }
        if intent_hash != block.intent_hash {
            return Err(LedgerError::IntentMismatch);
        }

        // Real fund movement: net each commitment sync into a single transfer.
        for intent in intents {
            match intent {
                Transition::SyncCommitment {
                    strategy_id,
                    pending_commit_amount,
                    pending_uncommit_amount,
                    ..
                } => {
                    let strategy = self
                        .strategies
                        .get_mut(strategy_id)
                        .ok_or(LedgerError::UnknownStrategy(*strategy_id))?;
                    // Moving principal also moves the sync baseline, so later balance syncs
                    // report yield only.
                    let baseline = self.last_strategy_balances.entry(*strategy_id).or_insert(0);
                    if pending_commit_amount > pending_uncommit_amount {
                        let net = pending_commit_amount - pending_uncommit_amount;
                        strategy.aggregate_commit(net)?;
                        *baseline = baseline.saturating_add(net);
                    } else if pending_uncommit_amount > pending_commit_amount {
                        let net = pending_uncommit_amount - pending_commit_amount;
                        strategy.aggregate_uncommit(net)?;
                        *baseline = baseline.saturating_sub(net);
                    }
                }
                Transition::SyncBalance { .. } => {
                    // Cleared from the queue below; the balance was already realized externally.
                }
                _ => return Err(LedgerError::IntentMismatch),
            }
        }

        self.deposits.clear_block(block_id);
        self.balance_syncs.clear_block(block_id);
        for wc in self.withdraw_commits.remove(&block_id).unwrap_or_default() {
            let credit = self
                .pending_withdraws
                .entry((wc.account, wc.asset_id))
                .or_insert(0);
            *credit = credit.saturating_add(wc.amount);
        }

        self.blocks[self.next_execute].status = BlockStatus::Executed;
        self.next_execute += 1;
        info!(block_id, "block executed");
        self.emit(RollupEvent::RollupBlockExecuted { block_id });
        Ok(block_id)
    }

    /// Halts intake. Only the emergency drain is permitted while paused.
    pub fn pause(&mut self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.paused = true;
        warn!("ledger paused");
        Ok(())
    }

    /// Resumes intake.
    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.paused = false;
        info!("ledger unpaused");
        Ok(())
    }

    /// Whether intake is currently halted.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the cumulative deposit limit for an asset.
    pub fn set_net_deposit_limit(
        &mut self,
        asset_id: AssetId,
        limit: Amount,
    ) -> Result<(), LedgerError> {
        if self.registry.asset_index_to_address(asset_id).is_none() {
            return Err(LedgerError::UnknownAsset(asset_id));
        }
        self.net_deposit_limits.insert(asset_id, limit);
        Ok(())
    }

    /// Sets the challenge window for blocks committed from now on.
    pub fn set_block_challenge_period(&mut self, seconds: u64) {
        self.challenge_period = seconds;
    }

    /// Emergency drain of custodied assets, permitted only while paused.
    pub fn drain_asset(&mut self, asset_id: AssetId, amount: Amount) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        if self.registry.asset_index_to_address(asset_id).is_none() {
            return Err(LedgerError::UnknownAsset(asset_id));
        }
        warn!(asset_id, amount, "emergency drain");
        Ok(())
    }

    pub(crate) fn block_mut(&mut self, block_id: BlockId) -> Option<&mut RollupBlock> {
        self.blocks.get_mut(block_id as usize)
    }

    pub(crate) fn rewind_queues(&mut self, block_id: BlockId) {
        self.deposits.revert_block(block_id);
        self.balance_syncs.revert_block(block_id);
        self.withdraw_commits.remove(&block_id);
    }
}
