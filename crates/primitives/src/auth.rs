//! Owner authorizations.
//!
//! Withdraw, commit and uncommit transitions must carry a schnorr signature by the account owner
//! over a domain-tagged digest of `{account, asset-or-strategy id, amount, nonce}`. The account
//! address *is* the x-only verification key, so no extra key registry is needed.

use borsh::BorshSerialize;
use secp256k1::{schnorr, Message, XOnlyPublicKey, SECP256K1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::types::{AccountAddress, Amount, AssetId, StrategyId, Timestamp};

/// A 64-byte schnorr signature authorizing one owner transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSig(#[serde(with = "hex::serde")] pub [u8; 64]);

impl borsh::BorshSerialize for OwnerSig {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.0)
    }
}

impl borsh::BorshDeserialize for OwnerSig {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut buf = [0u8; 64];
        reader.read_exact(&mut buf)?;
        Ok(Self(buf))
    }
}

/// Ways an authorization can fail verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The account address does not parse as an x-only public key.
    #[error("account address is not a valid verification key")]
    InvalidKey,

    /// The signature bytes do not verify over the authorization digest.
    #[error("signature does not verify")]
    BadSignature,
}

/// Domain separation tags for the authorization digests. Borsh-encoded as the first byte of the
/// signed payload so a withdraw authorization can never replay as a commit.
#[derive(Debug, Clone, Copy, BorshSerialize)]
enum AuthScope {
    Withdraw,
    Commit,
    Uncommit,
}

#[derive(BorshSerialize)]
struct AuthPayload {
    scope: AuthScope,
    account: AccountAddress,
    target_id: u32,
    amount: Amount,
    nonce: Timestamp,
}

fn auth_digest(payload: &AuthPayload) -> [u8; 32] {
    let bytes = borsh::to_vec(payload).expect("auth payload encoding is infallible");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hasher.finalize().into()
}

/// The digest an owner signs to authorize a withdrawal.
pub fn withdraw_digest(
    account: &AccountAddress,
    asset_id: AssetId,
    amount: Amount,
    nonce: Timestamp,
) -> [u8; 32] {
    auth_digest(&AuthPayload {
        scope: AuthScope::Withdraw,
        account: *account,
        target_id: asset_id,
        amount,
        nonce,
    })
}

/// The digest an owner signs to authorize committing idle funds into a strategy.
pub fn commit_digest(
    account: &AccountAddress,
    strategy_id: StrategyId,
    amount: Amount,
    nonce: Timestamp,
) -> [u8; 32] {
    auth_digest(&AuthPayload {
        scope: AuthScope::Commit,
        account: *account,
        target_id: strategy_id,
        amount,
        nonce,
    })
}

/// The digest an owner signs to authorize uncommitting st tokens out of a strategy.
pub fn uncommit_digest(
    account: &AccountAddress,
    strategy_id: StrategyId,
    st_token_amount: Amount,
    nonce: Timestamp,
) -> [u8; 32] {
    auth_digest(&AuthPayload {
        scope: AuthScope::Uncommit,
        account: *account,
        target_id: strategy_id,
        amount: st_token_amount,
        nonce,
    })
}

/// Verifies `sig` by the owner of `account` over `digest`.
pub fn verify(account: &AccountAddress, digest: &[u8; 32], sig: &OwnerSig) -> Result<(), AuthError> {
    let key = XOnlyPublicKey::from_slice(&account.0).map_err(|_| AuthError::InvalidKey)?;
    let sig = schnorr::Signature::from_slice(&sig.0).map_err(|_| AuthError::BadSignature)?;
    let msg = Message::from_digest(*digest);

    SECP256K1
        .verify_schnorr(&sig, &msg, &key)
        .map_err(|_| AuthError::BadSignature)
}

#[cfg(test)]
mod tests {
    use secp256k1::Keypair;

    use super::*;

    fn keyed_account() -> (Keypair, AccountAddress) {
        let keypair = Keypair::new(SECP256K1, &mut rand::thread_rng());
        let (xonly, _) = keypair.x_only_public_key();
        (keypair, AccountAddress(xonly.serialize()))
    }

    fn sign(keypair: &Keypair, digest: &[u8; 32]) -> OwnerSig {
        let msg = Message::from_digest(*digest);
        OwnerSig(SECP256K1.sign_schnorr(&msg, keypair).serialize())
    }

    #[test]
    fn valid_signature_verifies() {
        let (keypair, account) = keyed_account();
        let digest = withdraw_digest(&account, 1, 500, 7);
        let sig = sign(&keypair, &digest);

        assert_eq!(verify(&account, &digest, &sig), Ok(()));
    }

    #[test]
    fn scopes_do_not_cross_verify() {
        let (keypair, account) = keyed_account();
        let withdraw = withdraw_digest(&account, 1, 500, 7);
        let commit = commit_digest(&account, 1, 500, 7);
        let sig = sign(&keypair, &withdraw);

        assert_eq!(
            verify(&account, &commit, &sig),
            Err(AuthError::BadSignature)
        );
    }

    #[test]
    fn foreign_key_is_rejected() {
        let (keypair, account) = keyed_account();
        let (_, other_account) = keyed_account();
        let digest = withdraw_digest(&account, 1, 500, 7);
        let sig = sign(&keypair, &digest);

        assert_eq!(
            verify(&other_account, &digest, &sig),
            Err(AuthError::BadSignature)
        );
    }
}
