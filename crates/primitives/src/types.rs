//! Base newtypes and aliases used throughout the rollup: 32-byte hashes, owner and collaborator
//! addresses, and the dense integer ids handed out by the registry.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Dense account id inside the account state tree, assigned on first deposit.
pub type AccountId = u32;

/// Asset id assigned by the registry; id `0` is reserved.
pub type AssetId = u32;

/// Strategy id assigned by the registry; id `0` is reserved.
pub type StrategyId = u32;

/// Sequence number of a rollup block.
pub type BlockId = u64;

/// Asset amounts and st token amounts, in the asset's smallest unit.
pub type Amount = u128;

/// Seconds. All time-dependent operations take an explicit `now` of this type.
pub type Timestamp = u64;

/// A 32-byte hash: tree nodes, leaf hashes, transition-list roots and state roots.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Hash32(#[serde(with = "hex::serde")] pub [u8; 32]);

impl Hash32 {
    /// The all-zero hash, used as the padding leaf of transition lists.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Hashes a byte string with sha256.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Hashes the concatenation `left || right`, the node rule of every tree in this workspace.
    pub fn combine(left: &Hash32, right: &Hash32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(left.0);
        hasher.update(right.0);
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

/// The address of an account owner: the serialized x-only schnorr public key that also verifies
/// the owner's transition authorizations.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct AccountAddress(#[serde(with = "hex::serde")] pub [u8; 32]);

impl AccountAddress {
    /// Whether this is the unset (all-zero) address of an empty account leaf.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The address of an external collaborator (an asset contract or a yield strategy) as registered
/// with the registry. Opaque to the core.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ExternalAddress(#[serde(with = "hex::serde")] pub [u8; 32]);

impl ExternalAddress {
    /// Whether this is the reserved all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for ExternalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
