//! The two leaf kinds of the state tree.
//!
//! An [`AccountLeaf`] binds an owner address to its dense account id and tracks the owner's idle
//! asset balances and strategy-token holdings. A [`StrategyLeaf`] tracks one strategy's custodied
//! balance, its st token supply and the commit/uncommit amounts pending aggregation. Both hash to
//! their canonical borsh encoding; the all-default leaf is the provably-empty leaf every tree
//! position starts out as.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{AccountAddress, AccountId, Amount, AssetId, Hash32, StrategyId, Timestamp};

/// One account's record in the account state tree.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct AccountLeaf {
    /// The owner address, set exactly once on the account's first deposit.
    pub account: AccountAddress,

    /// The dense id this address is bound to, fixed at the same moment as `account`.
    pub account_id: AccountId,

    /// Idle (uncommitted) balances, indexed by asset id and grown on demand.
    pub idle_assets: Vec<Amount>,

    /// Strategy-token holdings, indexed by strategy id and grown on demand.
    pub st_tokens: Vec<Amount>,

    /// The last authorization nonce consumed on behalf of this account. Owner-authorized
    /// transitions must carry a strictly larger nonce.
    pub timestamp: Timestamp,
}

impl AccountLeaf {
    /// Whether this is the canonical empty leaf of an untouched tree position.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The idle balance for `asset_id`, zero if the vector has not grown that far.
    pub fn idle_balance(&self, asset_id: AssetId) -> Amount {
        self.idle_assets
            .get(asset_id as usize)
            .copied()
            .unwrap_or(0)
    }

    /// The st token balance for `strategy_id`, zero if the vector has not grown that far.
    pub fn st_token_balance(&self, strategy_id: StrategyId) -> Amount {
        self.st_tokens
            .get(strategy_id as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Grows `idle_assets` as needed and returns the slot for `asset_id`.
    pub fn idle_slot(&mut self, asset_id: AssetId) -> &mut Amount {
        let idx = asset_id as usize;
        if self.idle_assets.len() <= idx {
            self.idle_assets.resize(idx + 1, 0);
        }
        &mut self.idle_assets[idx]
    }

    /// Grows `st_tokens` as needed and returns the slot for `strategy_id`.
    pub fn st_token_slot(&mut self, strategy_id: StrategyId) -> &mut Amount {
        let idx = strategy_id as usize;
        if self.st_tokens.len() <= idx {
            self.st_tokens.resize(idx + 1, 0);
        }
        &mut self.st_tokens[idx]
    }

    /// The leaf hash: sha256 over the canonical borsh encoding.
    pub fn hash(&self) -> Hash32 {
        Hash32::digest(&borsh::to_vec(self).expect("account leaf encoding is infallible"))
    }
}

/// One strategy's record in the strategy state tree.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct StrategyLeaf {
    /// The asset this strategy custodies.
    pub asset_id: AssetId,

    /// The asset balance attributed to this strategy, including amounts still pending
    /// aggregation.
    pub asset_balance: Amount,

    /// Total st tokens minted against `asset_balance`.
    pub st_token_supply: Amount,

    /// Commit value accumulated since the last commitment sync.
    pub pending_commit_amount: Amount,

    /// Uncommit value accumulated since the last commitment sync.
    pub pending_uncommit_amount: Amount,
}

impl StrategyLeaf {
    /// Whether this is the canonical empty leaf of an untouched tree position.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The leaf hash: sha256 over the canonical borsh encoding.
    pub fn hash(&self) -> Hash32 {
        Hash32::digest(&borsh::to_vec(self).expect("strategy leaf encoding is infallible"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_are_empty() {
        assert!(AccountLeaf::default().is_empty());
        assert!(StrategyLeaf::default().is_empty());
    }

    #[test]
    fn leaf_hash_tracks_content() {
        let mut leaf = AccountLeaf::default();
        let empty_hash = leaf.hash();

        *leaf.idle_slot(1) = 42;
        assert_ne!(leaf.hash(), empty_hash);
        assert_eq!(leaf.idle_balance(1), 42);
        assert_eq!(leaf.idle_balance(7), 0);
    }

    #[test]
    fn slots_grow_on_demand() {
        let mut leaf = AccountLeaf::default();
        *leaf.st_token_slot(3) = 9;

        assert_eq!(leaf.st_tokens.len(), 4);
        assert_eq!(leaf.st_token_balance(3), 9);
    }
}
