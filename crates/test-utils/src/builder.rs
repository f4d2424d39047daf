//! An honest operator-side block builder.
//!
//! The ledger stores only commitments, so tests need a party that holds the full state: both
//! sparse trees, the decoded leaves, and the strategy-asset bindings. The builder evaluates
//! every transition it emits, applies the effect to its shadow state and fills in the claimed
//! roots, so its output always chains correctly. Invalid claims for dispute tests are built by
//! hand from the builder's proofs instead.

use std::collections::HashMap;

use l2y_rollup_evaluator::{evaluate, EvalContext};
use l2y_rollup_ledger::TransitionProof;
use l2y_rollup_primitives::{
    AccountAddress, AccountId, AccountLeaf, Amount, AssetId, BlockId, Hash32, StrategyId,
    StrategyLeaf, Timestamp, Transition,
};
use l2y_rollup_state_tree::{
    state_root, transition_list_proof, SparseMerkleTree, StateProof,
};

use crate::keys::OwnerKey;

/// Operator-side shadow state emitting correctly-chained transitions.
#[derive(Debug)]
pub struct BlockBuilder {
    accounts: SparseMerkleTree,
    strategies: SparseMerkleTree,
    account_leaves: HashMap<AccountId, AccountLeaf>,
    strategy_leaves: HashMap<StrategyId, StrategyLeaf>,
    strategy_assets: HashMap<StrategyId, AssetId>,
    started: bool,
    genesis_root: Hash32,
}

impl BlockBuilder {
    /// Creates a builder over empty state trees of the given depth.
    pub fn new(depth: u8) -> Self {
        let accounts = SparseMerkleTree::new(depth, AccountLeaf::default().hash())
            .expect("valid account tree depth");
        let strategies = SparseMerkleTree::new(depth, StrategyLeaf::default().hash())
            .expect("valid strategy tree depth");
        let genesis_root = state_root(&accounts.root(), &strategies.root());

        Self {
            accounts,
            strategies,
            account_leaves: HashMap::new(),
            strategy_leaves: HashMap::new(),
            strategy_assets: HashMap::new(),
            started: false,
            genesis_root,
        }
    }

    /// Records the registry's strategy-to-asset binding, mirrored into evaluation contexts.
    pub fn bind_strategy_asset(&mut self, strategy_id: StrategyId, asset_id: AssetId) {
        self.strategy_assets.insert(strategy_id, asset_id);
    }

    /// The combined state root of the shadow state.
    pub fn state_root(&self) -> Hash32 {
        state_root(&self.accounts.root(), &self.strategies.root())
    }

    /// The genesis state root (two empty trees).
    pub fn genesis_root(&self) -> Hash32 {
        self.genesis_root
    }

    /// The current decoded account leaf.
    pub fn account_leaf(&self, account_id: AccountId) -> AccountLeaf {
        self.account_leaves
            .get(&account_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The current decoded strategy leaf.
    pub fn strategy_leaf(&self, strategy_id: StrategyId) -> StrategyLeaf {
        self.strategy_leaves
            .get(&strategy_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Proves the account leaf against the current state root.
    pub fn account_proof(&self, account_id: AccountId) -> StateProof<AccountLeaf> {
        StateProof {
            leaf: self.account_leaf(account_id),
            other_root: self.strategies.root(),
            proof: self
                .accounts
                .prove(u64::from(account_id))
                .expect("account id fits the tree"),
        }
    }

    /// Proves the strategy leaf against the current state root.
    pub fn strategy_proof(&self, strategy_id: StrategyId) -> StateProof<StrategyLeaf> {
        StateProof {
            leaf: self.strategy_leaf(strategy_id),
            other_root: self.accounts.root(),
            proof: self
                .strategies
                .prove(u64::from(strategy_id))
                .expect("strategy id fits the tree"),
        }
    }

    /// Evaluates a transition whose `pre_root` is already the current root, applies its effect
    /// to the shadow state and fills in the resulting `post_root`.
    fn apply(&mut self, mut transition: Transition) -> Transition {
        let ctx = EvalContext {
            chain_start: !self.started,
            genesis_root: self.genesis_root,
            strategy_asset: transition
                .strategy_id()
                .and_then(|id| self.strategy_assets.get(&id).copied()),
        };
        let account = transition
            .account_id()
            .map(|id| self.account_leaf(id))
            .unwrap_or_default();
        let strategy = transition
            .strategy_id()
            .map(|id| self.strategy_leaf(id))
            .unwrap_or_default();

        let effect =
            evaluate(&ctx, &transition, &account, &strategy).expect("honest transition evaluates");

        if let Some(id) = transition.account_id() {
            self.accounts
                .set(u64::from(id), effect.account.hash())
                .expect("account id fits the tree");
            self.account_leaves.insert(id, effect.account);
        }
        if let Some(id) = transition.strategy_id() {
            self.strategies
                .set(u64::from(id), effect.strategy.hash())
                .expect("strategy id fits the tree");
            self.strategy_leaves.insert(id, effect.strategy);
        }
        self.started = true;

        transition.set_post_root(self.state_root());
        transition
    }

    /// The chain's first transition.
    pub fn init(&mut self) -> Transition {
        self.apply(Transition::Init {
            pre_root: self.genesis_root,
            post_root: Hash32::zero(),
        })
    }

    /// Credits a queued deposit, binding the address on first appearance.
    pub fn deposit(
        &mut self,
        account: AccountAddress,
        account_id: AccountId,
        asset_id: AssetId,
        amount: Amount,
    ) -> Transition {
        self.apply(Transition::Deposit {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            account,
            account_id,
            asset_id,
            amount,
        })
    }

    /// Debits idle balance for a payout, signed by the owner.
    pub fn withdraw(
        &mut self,
        key: &OwnerKey,
        account_id: AccountId,
        asset_id: AssetId,
        amount: Amount,
        nonce: Timestamp,
    ) -> Transition {
        self.apply(Transition::Withdraw {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            account: key.address(),
            account_id,
            asset_id,
            amount,
            nonce,
            signature: key.sign_withdraw(asset_id, amount, nonce),
        })
    }

    /// Moves idle balance into a strategy, signed by the owner.
    pub fn commit(
        &mut self,
        key: &OwnerKey,
        account_id: AccountId,
        strategy_id: StrategyId,
        amount: Amount,
        nonce: Timestamp,
    ) -> Transition {
        self.apply(Transition::Commit {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            account: key.address(),
            account_id,
            strategy_id,
            amount,
            nonce,
            signature: key.sign_commit(strategy_id, amount, nonce),
        })
    }

    /// Burns st tokens back into idle balance, signed by the owner.
    pub fn uncommit(
        &mut self,
        key: &OwnerKey,
        account_id: AccountId,
        strategy_id: StrategyId,
        st_token_amount: Amount,
        nonce: Timestamp,
    ) -> Transition {
        self.apply(Transition::Uncommit {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            account: key.address(),
            account_id,
            strategy_id,
            st_token_amount,
            nonce,
            signature: key.sign_uncommit(strategy_id, st_token_amount, nonce),
        })
    }

    /// Nets the strategy's pending buckets into an execution intent, claiming their current
    /// values from the shadow leaf.
    pub fn sync_commitment(&mut self, strategy_id: StrategyId) -> Transition {
        let leaf = self.strategy_leaf(strategy_id);
        self.apply(Transition::SyncCommitment {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            strategy_id,
            pending_commit_amount: leaf.pending_commit_amount,
            pending_uncommit_amount: leaf.pending_uncommit_amount,
        })
    }

    /// Records an externally observed balance delta.
    pub fn sync_balance(&mut self, strategy_id: StrategyId, delta: Amount) -> Transition {
        self.apply(Transition::SyncBalance {
            pre_root: self.state_root(),
            post_root: Hash32::zero(),
            strategy_id,
            delta,
        })
    }
}

/// Inclusion proofs for every transition of one committed block.
pub fn transition_proofs(block_id: BlockId, transitions: &[Transition]) -> Vec<TransitionProof> {
    let leaves: Vec<Hash32> = transitions.iter().map(Transition::hash).collect();
    transitions
        .iter()
        .enumerate()
        .map(|(index, transition)| TransitionProof {
            block_id,
            transition: transition.clone(),
            proof: transition_list_proof(&leaves, index as u64).expect("index is in range"),
        })
        .collect()
}
