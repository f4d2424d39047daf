//! The evaluation function itself: one exhaustive match over the transition kinds.

use l2y_rollup_primitives::{
    auth, AccountAddress, AccountId, AccountLeaf, Amount, AssetId, Hash32, StrategyLeaf,
    Transition,
};

use crate::errors::EvalError;

/// The context a transition is evaluated in. Pure data; the dispute resolver and the operator
/// fill it from their own view of the chain and the registry.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext {
    /// Whether the transition sits at the very beginning of the chain (block 0, index 0). Only
    /// an `Init` may stand there, and only there.
    pub chain_start: bool,

    /// The designated genesis state root.
    pub genesis_root: Hash32,

    /// The asset the registry binds to the transition's strategy, for strategy transitions.
    pub strategy_asset: Option<AssetId>,
}

/// The updated leaves a transition evaluates to. Untouched sides are carried through unchanged
/// so callers can recompute both tree roots uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEffect {
    /// The account leaf after the transition.
    pub account: AccountLeaf,

    /// The strategy leaf after the transition.
    pub strategy: StrategyLeaf,
}

/// Evaluates one transition against the leaves it touches.
///
/// `account` must be the leaf at the transition's account id and `strategy` the leaf at its
/// strategy id, both in the pre-state; for transitions that do not touch a side, any leaf of
/// that side may be passed and is carried through unchanged.
pub fn evaluate(
    ctx: &EvalContext,
    transition: &Transition,
    account: &AccountLeaf,
    strategy: &StrategyLeaf,
) -> Result<TransitionEffect, EvalError> {
    if ctx.chain_start && !matches!(transition, Transition::Init { .. }) {
        return Err(EvalError::InvalidInitTransition);
    }

    match transition {
        Transition::Init { pre_root, .. } => {
            if !ctx.chain_start || *pre_root != ctx.genesis_root {
                return Err(EvalError::InvalidInitTransition);
            }
            Ok(TransitionEffect {
                account: AccountLeaf::default(),
                strategy: StrategyLeaf::default(),
            })
        }

        Transition::Deposit {
            account: address,
            account_id,
            asset_id,
            amount,
            ..
        } => {
            let mut leaf = account.clone();
            if leaf.is_empty() {
                // First appearance: bind the address to the id, exactly once.
                leaf.account = *address;
                leaf.account_id = *account_id;
            } else if leaf.account != *address || leaf.account_id != *account_id {
                return Err(EvalError::InvalidAccountId);
            }

            let slot = leaf.idle_slot(*asset_id);
            *slot = slot.checked_add(*amount).ok_or(EvalError::Overflow)?;

            Ok(TransitionEffect {
                account: leaf,
                strategy: strategy.clone(),
            })
        }

        Transition::Withdraw {
            account: address,
            account_id,
            asset_id,
            amount,
            nonce,
            signature,
            ..
        } => {
            let mut leaf = bound_account(account, address, *account_id)?;
            auth::verify(
                address,
                &auth::withdraw_digest(address, *asset_id, *amount, *nonce),
                signature,
            )?;
            consume_nonce(&mut leaf, *nonce)?;

            debit(leaf.idle_slot(*asset_id), *amount, EvalError::InsufficientIdleBalance)?;

            Ok(TransitionEffect {
                account: leaf,
                strategy: strategy.clone(),
            })
        }

        Transition::Commit {
            account: address,
            account_id,
            strategy_id,
            amount,
            nonce,
            signature,
            ..
        } => {
            let mut leaf = bound_account(account, address, *account_id)?;
            auth::verify(
                address,
                &auth::commit_digest(address, *strategy_id, *amount, *nonce),
                signature,
            )?;
            consume_nonce(&mut leaf, *nonce)?;

            let mut st = bound_strategy(strategy, ctx.strategy_asset)?;

            debit(leaf.idle_slot(st.asset_id), *amount, EvalError::InsufficientIdleBalance)?;

            // Mint st tokens at the current exchange rate; 1:1 when the pool is empty.
            let minted = if st.st_token_supply == 0 || st.asset_balance == 0 {
                *amount
            } else {
                mul_div(*amount, st.st_token_supply, st.asset_balance)?
            };

            credit(leaf.st_token_slot(*strategy_id), minted)?;
            st.st_token_supply = st
                .st_token_supply
                .checked_add(minted)
                .ok_or(EvalError::Overflow)?;
            st.asset_balance = st
                .asset_balance
                .checked_add(*amount)
                .ok_or(EvalError::Overflow)?;
            st.pending_commit_amount = st
                .pending_commit_amount
                .checked_add(*amount)
                .ok_or(EvalError::Overflow)?;

            Ok(TransitionEffect {
                account: leaf,
                strategy: st,
            })
        }

        Transition::Uncommit {
            account: address,
            account_id,
            strategy_id,
            st_token_amount,
            nonce,
            signature,
            ..
        } => {
            let mut leaf = bound_account(account, address, *account_id)?;
            auth::verify(
                address,
                &auth::uncommit_digest(address, *strategy_id, *st_token_amount, *nonce),
                signature,
            )?;
            consume_nonce(&mut leaf, *nonce)?;

            let mut st = bound_strategy(strategy, ctx.strategy_asset)?;
            if st.st_token_supply == 0 {
                return Err(EvalError::InsufficientStTokens);
            }

            let asset_out = mul_div(*st_token_amount, st.asset_balance, st.st_token_supply)?;

            debit(
                leaf.st_token_slot(*strategy_id),
                *st_token_amount,
                EvalError::InsufficientStTokens,
            )?;
            credit(leaf.idle_slot(st.asset_id), asset_out)?;

            st.st_token_supply = st
                .st_token_supply
                .checked_sub(*st_token_amount)
                .ok_or(EvalError::InsufficientStTokens)?;
            st.asset_balance = st
                .asset_balance
                .checked_sub(asset_out)
                .ok_or(EvalError::Overflow)?;
            st.pending_uncommit_amount = st
                .pending_uncommit_amount
                .checked_add(asset_out)
                .ok_or(EvalError::Overflow)?;

            Ok(TransitionEffect {
                account: leaf,
                strategy: st,
            })
        }

        Transition::SyncCommitment {
            pending_commit_amount,
            pending_uncommit_amount,
            ..
        } => {
            let mut st = strategy.clone();
            if st.pending_commit_amount != *pending_commit_amount
                || st.pending_uncommit_amount != *pending_uncommit_amount
            {
                return Err(EvalError::PendingMismatch);
            }
            st.pending_commit_amount = 0;
            st.pending_uncommit_amount = 0;

            Ok(TransitionEffect {
                account: account.clone(),
                strategy: st,
            })
        }

        Transition::SyncBalance { delta, .. } => {
            let mut st = bound_strategy(strategy, ctx.strategy_asset)?;
            st.asset_balance = st
                .asset_balance
                .checked_add(*delta)
                .ok_or(EvalError::Overflow)?;

            Ok(TransitionEffect {
                account: account.clone(),
                strategy: st,
            })
        }
    }
}

/// The account leaf an owner-authorized transition operates on: must already be bound to the
/// claimed owner.
fn bound_account(
    leaf: &AccountLeaf,
    address: &AccountAddress,
    account_id: AccountId,
) -> Result<AccountLeaf, EvalError> {
    if leaf.is_empty() || leaf.account != *address || leaf.account_id != account_id {
        return Err(EvalError::AccountMismatch);
    }
    Ok(leaf.clone())
}

/// The strategy leaf a strategy transition operates on. An empty leaf binds the registry's asset
/// on first touch; a non-empty leaf must agree with the registry.
fn bound_strategy(
    leaf: &StrategyLeaf,
    registry_asset: Option<AssetId>,
) -> Result<StrategyLeaf, EvalError> {
    let mut st = leaf.clone();
    match registry_asset {
        Some(asset_id) if st.is_empty() => st.asset_id = asset_id,
        Some(asset_id) if st.asset_id == asset_id => {}
        _ => return Err(EvalError::StrategyAssetMismatch),
    }
    Ok(st)
}

fn consume_nonce(leaf: &mut AccountLeaf, nonce: u64) -> Result<(), EvalError> {
    if nonce <= leaf.timestamp {
        return Err(EvalError::StaleNonce);
    }
    leaf.timestamp = nonce;
    Ok(())
}

fn debit(slot: &mut Amount, amount: Amount, underflow: EvalError) -> Result<(), EvalError> {
    *slot = slot.checked_sub(amount).ok_or(underflow)?;
    Ok(())
}

fn credit(slot: &mut Amount, amount: Amount) -> Result<(), EvalError> {
    *slot = slot.checked_add(amount).ok_or(EvalError::Overflow)?;
    Ok(())
}

fn mul_div(a: Amount, b: Amount, d: Amount) -> Result<Amount, EvalError> {
    a.checked_mul(b)
        .ok_or(EvalError::Overflow)?
        .checked_div(d)
        .ok_or(EvalError::Overflow)
}

#[cfg(test)]
mod tests {
    use l2y_rollup_primitives::auth::OwnerSig;
    use secp256k1::{Keypair, Message, SECP256K1};

    use super::*;

    const GENESIS: Hash32 = Hash32([9u8; 32]);

    fn ctx(chain_start: bool, strategy_asset: Option<AssetId>) -> EvalContext {
        EvalContext {
            chain_start,
            genesis_root: GENESIS,
            strategy_asset,
        }
    }

    fn keyed_account() -> (Keypair, AccountAddress) {
        let keypair = Keypair::new(SECP256K1, &mut rand::thread_rng());
        let (xonly, _) = keypair.x_only_public_key();
        (keypair, AccountAddress(xonly.serialize()))
    }

    fn sign(keypair: &Keypair, digest: [u8; 32]) -> OwnerSig {
        OwnerSig(
            SECP256K1
                .sign_schnorr(&Message::from_digest(digest), keypair)
                .serialize(),
        )
    }

    fn funded_account(address: AccountAddress, asset_id: AssetId, amount: Amount) -> AccountLeaf {
        let mut leaf = AccountLeaf {
            account: address,
            account_id: 1,
            ..Default::default()
        };
        *leaf.idle_slot(asset_id) = amount;
        leaf
    }

    #[test]
    fn init_only_at_chain_start() {
        let init = Transition::Init {
            pre_root: GENESIS,
            post_root: GENESIS,
        };
        let empty = AccountLeaf::default();
        let st = StrategyLeaf::default();

        assert!(evaluate(&ctx(true, None), &init, &empty, &st).is_ok());
        assert_eq!(
            evaluate(&ctx(false, None), &init, &empty, &st),
            Err(EvalError::InvalidInitTransition)
        );
    }

    #[test]
    fn init_must_claim_genesis_pre_root() {
        let init = Transition::Init {
            pre_root: Hash32::digest(b"not genesis"),
            post_root: GENESIS,
        };
        assert_eq!(
            evaluate(
                &ctx(true, None),
                &init,
                &AccountLeaf::default(),
                &StrategyLeaf::default()
            ),
            Err(EvalError::InvalidInitTransition)
        );
    }

    #[test]
    fn non_init_at_chain_start_is_invalid() {
        let (_, address) = keyed_account();
        let deposit = Transition::Deposit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            asset_id: 1,
            amount: 5,
        };
        assert_eq!(
            evaluate(
                &ctx(true, None),
                &deposit,
                &AccountLeaf::default(),
                &StrategyLeaf::default()
            ),
            Err(EvalError::InvalidInitTransition)
        );
    }

    #[test]
    fn first_deposit_binds_address_to_id() {
        let (_, address) = keyed_account();
        let deposit = Transition::Deposit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 3,
            asset_id: 1,
            amount: 100,
        };

        let effect = evaluate(
            &ctx(false, None),
            &deposit,
            &AccountLeaf::default(),
            &StrategyLeaf::default(),
        )
        .unwrap();

        assert_eq!(effect.account.account, address);
        assert_eq!(effect.account.account_id, 3);
        assert_eq!(effect.account.idle_balance(1), 100);
    }

    #[test]
    fn deposit_to_foreign_binding_is_invalid_account_id() {
        let (_, owner) = keyed_account();
        let (_, intruder) = keyed_account();
        let bound = funded_account(owner, 1, 10);

        let deposit = Transition::Deposit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: intruder,
            account_id: 1,
            asset_id: 1,
            amount: 1,
        };
        assert_eq!(
            evaluate(&ctx(false, None), &deposit, &bound, &StrategyLeaf::default()),
            Err(EvalError::InvalidAccountId)
        );
    }

    #[test]
    fn withdraw_checks_signature_nonce_and_balance() {
        let (keypair, address) = keyed_account();
        let leaf = funded_account(address, 1, 100);
        let st = StrategyLeaf::default();

        let good = Transition::Withdraw {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            asset_id: 1,
            amount: 40,
            nonce: 5,
            signature: sign(&keypair, auth::withdraw_digest(&address, 1, 40, 5)),
        };
        let effect = evaluate(&ctx(false, None), &good, &leaf, &st).unwrap();
        assert_eq!(effect.account.idle_balance(1), 60);
        assert_eq!(effect.account.timestamp, 5);

        let overdrawn = Transition::Withdraw {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            asset_id: 1,
            amount: 500,
            nonce: 5,
            signature: sign(&keypair, auth::withdraw_digest(&address, 1, 500, 5)),
        };
        assert_eq!(
            evaluate(&ctx(false, None), &overdrawn, &leaf, &st),
            Err(EvalError::InsufficientIdleBalance)
        );

        let forged = Transition::Withdraw {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            asset_id: 1,
            amount: 40,
            nonce: 5,
            // Signed over a different amount.
            signature: sign(&keypair, auth::withdraw_digest(&address, 1, 41, 5)),
        };
        assert!(matches!(
            evaluate(&ctx(false, None), &forged, &leaf, &st),
            Err(EvalError::BadAuthorization(_))
        ));

        let mut stale_leaf = leaf.clone();
        stale_leaf.timestamp = 5;
        assert_eq!(
            evaluate(&ctx(false, None), &good, &stale_leaf, &st),
            Err(EvalError::StaleNonce)
        );
    }

    #[test]
    fn commit_mints_at_the_current_exchange_rate() {
        let (keypair, address) = keyed_account();
        let leaf = funded_account(address, 2, 1_000);
        // Pool at rate 2 asset per st token.
        let st = StrategyLeaf {
            asset_id: 2,
            asset_balance: 200,
            st_token_supply: 100,
            ..Default::default()
        };

        let commit = Transition::Commit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            strategy_id: 1,
            amount: 50,
            nonce: 1,
            signature: sign(&keypair, auth::commit_digest(&address, 1, 50, 1)),
        };
        let effect = evaluate(&ctx(false, Some(2)), &commit, &leaf, &st).unwrap();

        assert_eq!(effect.account.idle_balance(2), 950);
        assert_eq!(effect.account.st_token_balance(1), 25);
        assert_eq!(effect.strategy.st_token_supply, 125);
        assert_eq!(effect.strategy.asset_balance, 250);
        assert_eq!(effect.strategy.pending_commit_amount, 50);
    }

    #[test]
    fn first_commit_to_an_empty_pool_is_one_to_one() {
        let (keypair, address) = keyed_account();
        let leaf = funded_account(address, 2, 100);

        let commit = Transition::Commit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            strategy_id: 1,
            amount: 30,
            nonce: 1,
            signature: sign(&keypair, auth::commit_digest(&address, 1, 30, 1)),
        };
        let effect =
            evaluate(&ctx(false, Some(2)), &commit, &leaf, &StrategyLeaf::default()).unwrap();

        assert_eq!(effect.account.st_token_balance(1), 30);
        assert_eq!(effect.strategy.asset_id, 2);
        assert_eq!(effect.strategy.st_token_supply, 30);
    }

    #[test]
    fn commit_without_registry_binding_is_rejected() {
        let (keypair, address) = keyed_account();
        let leaf = funded_account(address, 2, 100);
        let commit = Transition::Commit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            strategy_id: 1,
            amount: 30,
            nonce: 1,
            signature: sign(&keypair, auth::commit_digest(&address, 1, 30, 1)),
        };

        assert_eq!(
            evaluate(&ctx(false, None), &commit, &leaf, &StrategyLeaf::default()),
            Err(EvalError::StrategyAssetMismatch)
        );
    }

    #[test]
    fn uncommit_burns_and_restores_idle_balance() {
        let (keypair, address) = keyed_account();
        let mut leaf = funded_account(address, 2, 0);
        *leaf.st_token_slot(1) = 25;
        let st = StrategyLeaf {
            asset_id: 2,
            asset_balance: 250,
            st_token_supply: 125,
            ..Default::default()
        };

        let uncommit = Transition::Uncommit {
            pre_root: GENESIS,
            post_root: GENESIS,
            account: address,
            account_id: 1,
            strategy_id: 1,
            st_token_amount: 25,
            nonce: 2,
            signature: sign(&keypair, auth::uncommit_digest(&address, 1, 25, 2)),
        };
        let effect = evaluate(&ctx(false, Some(2)), &uncommit, &leaf, &st).unwrap();

        assert_eq!(effect.account.st_token_balance(1), 0);
        assert_eq!(effect.account.idle_balance(2), 50);
        assert_eq!(effect.strategy.st_token_supply, 100);
        assert_eq!(effect.strategy.asset_balance, 200);
        assert_eq!(effect.strategy.pending_uncommit_amount, 50);
    }

    #[test]
    fn sync_commitment_requires_matching_buckets() {
        let st = StrategyLeaf {
            asset_id: 1,
            asset_balance: 100,
            st_token_supply: 100,
            pending_commit_amount: 60,
            pending_uncommit_amount: 10,
        };
        let account = AccountLeaf::default();

        let good = Transition::SyncCommitment {
            pre_root: GENESIS,
            post_root: GENESIS,
            strategy_id: 1,
            pending_commit_amount: 60,
            pending_uncommit_amount: 10,
        };
        let effect = evaluate(&ctx(false, Some(1)), &good, &account, &st).unwrap();
        assert_eq!(effect.strategy.pending_commit_amount, 0);
        assert_eq!(effect.strategy.pending_uncommit_amount, 0);

        let bad = Transition::SyncCommitment {
            pre_root: GENESIS,
            post_root: GENESIS,
            strategy_id: 1,
            pending_commit_amount: 61,
            pending_uncommit_amount: 10,
        };
        assert_eq!(
            evaluate(&ctx(false, Some(1)), &bad, &account, &st),
            Err(EvalError::PendingMismatch)
        );
    }

    #[test]
    fn sync_balance_credits_realized_yield() {
        let st = StrategyLeaf {
            asset_id: 1,
            asset_balance: 100,
            st_token_supply: 100,
            ..Default::default()
        };
        let sync = Transition::SyncBalance {
            pre_root: GENESIS,
            post_root: GENESIS,
            strategy_id: 1,
            delta: 7,
        };
        let effect = evaluate(&ctx(false, Some(1)), &sync, &AccountLeaf::default(), &st).unwrap();

        assert_eq!(effect.strategy.asset_balance, 107);
    }
}
