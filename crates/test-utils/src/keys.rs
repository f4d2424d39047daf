//! Owner keypairs for tests.

use l2y_rollup_primitives::{
    auth::{commit_digest, uncommit_digest, withdraw_digest, OwnerSig},
    AccountAddress, Amount, AssetId, StrategyId, Timestamp,
};
use secp256k1::{Keypair, Message, SECP256K1};

/// A schnorr owner keypair whose x-only public key doubles as the account address.
#[derive(Debug)]
pub struct OwnerKey {
    keypair: Keypair,
}

impl OwnerKey {
    /// Generates a fresh random owner.
    pub fn random() -> Self {
        Self {
            keypair: Keypair::new(SECP256K1, &mut rand::thread_rng()),
        }
    }

    /// The account address, i.e. the serialized x-only public key.
    pub fn address(&self) -> AccountAddress {
        let (xonly, _) = self.keypair.x_only_public_key();
        AccountAddress(xonly.serialize())
    }

    /// Signs an arbitrary 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> OwnerSig {
        let msg = Message::from_digest(*digest);
        OwnerSig(SECP256K1.sign_schnorr(&msg, &self.keypair).serialize())
    }

    /// Authorizes a withdrawal.
    pub fn sign_withdraw(&self, asset_id: AssetId, amount: Amount, nonce: Timestamp) -> OwnerSig {
        self.sign_digest(&withdraw_digest(&self.address(), asset_id, amount, nonce))
    }

    /// Authorizes committing idle funds into a strategy.
    pub fn sign_commit(&self, strategy_id: StrategyId, amount: Amount, nonce: Timestamp) -> OwnerSig {
        self.sign_digest(&commit_digest(&self.address(), strategy_id, amount, nonce))
    }

    /// Authorizes uncommitting st tokens out of a strategy.
    pub fn sign_uncommit(
        &self,
        strategy_id: StrategyId,
        st_token_amount: Amount,
        nonce: Timestamp,
    ) -> OwnerSig {
        self.sign_digest(&uncommit_digest(
            &self.address(),
            strategy_id,
            st_token_amount,
            nonce,
        ))
    }
}
