//! The asset/strategy registry collaborator.
//!
//! Assigns stable, dense integer ids to asset and strategy addresses. Both mappings are fixed
//! bijections with id 0 reserved; the core only ever reads them.

use l2y_rollup_primitives::{AssetId, ExternalAddress, StrategyId};
use std::collections::HashMap;

use crate::errors::RegistryError;

/// The id registry for assets and strategies.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    assets: Vec<ExternalAddress>,
    asset_ids: HashMap<ExternalAddress, AssetId>,
    strategies: Vec<ExternalAddress>,
    strategy_ids: HashMap<ExternalAddress, StrategyId>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset address and returns its id (dense, starting at 1).
    pub fn register_asset(&mut self, address: ExternalAddress) -> Result<AssetId, RegistryError> {
        if address.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if self.asset_ids.contains_key(&address) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.assets.push(address);
        let id = self.assets.len() as AssetId;
        self.asset_ids.insert(address, id);
        Ok(id)
    }

    /// Registers a strategy address and returns its id (dense, starting at 1).
    pub fn register_strategy(
        &mut self,
        address: ExternalAddress,
    ) -> Result<StrategyId, RegistryError> {
        if address.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        if self.strategy_ids.contains_key(&address) {
            return Err(RegistryError::AlreadyRegistered);
        }
        self.strategies.push(address);
        let id = self.strategies.len() as StrategyId;
        self.strategy_ids.insert(address, id);
        Ok(id)
    }

    /// The address registered under an asset id, if any. Id 0 is never mapped.
    pub fn asset_index_to_address(&self, id: AssetId) -> Option<ExternalAddress> {
        if id == 0 {
            return None;
        }
        self.assets.get(id as usize - 1).copied()
    }

    /// The id an asset address is registered under, if any.
    pub fn asset_address_to_index(&self, address: &ExternalAddress) -> Option<AssetId> {
        self.asset_ids.get(address).copied()
    }

    /// The address registered under a strategy id, if any. Id 0 is never mapped.
    pub fn strategy_index_to_address(&self, id: StrategyId) -> Option<ExternalAddress> {
        if id == 0 {
            return None;
        }
        self.strategies.get(id as usize - 1).copied()
    }

    /// The id a strategy address is registered under, if any.
    pub fn strategy_address_to_index(&self, address: &ExternalAddress) -> Option<StrategyId> {
        self.strategy_ids.get(address).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> ExternalAddress {
        ExternalAddress([byte; 32])
    }

    #[test]
    fn ids_are_dense_and_one_based() {
        let mut registry = Registry::new();
        assert_eq!(registry.register_asset(addr(1)).unwrap(), 1);
        assert_eq!(registry.register_asset(addr(2)).unwrap(), 2);
        assert_eq!(registry.register_strategy(addr(3)).unwrap(), 1);

        assert_eq!(registry.asset_index_to_address(1), Some(addr(1)));
        assert_eq!(registry.asset_address_to_index(&addr(2)), Some(2));
        assert_eq!(registry.strategy_index_to_address(1), Some(addr(3)));
        assert_eq!(registry.asset_index_to_address(0), None);
        assert_eq!(registry.strategy_index_to_address(2), None);
    }

    #[test]
    fn reserved_and_duplicate_registrations_are_rejected() {
        let mut registry = Registry::new();
        assert_eq!(
            registry.register_asset(ExternalAddress::default()),
            Err(RegistryError::ZeroAddress)
        );
        registry.register_asset(addr(1)).unwrap();
        assert_eq!(
            registry.register_asset(addr(1)),
            Err(RegistryError::AlreadyRegistered)
        );
    }
}
