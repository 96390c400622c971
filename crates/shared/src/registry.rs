//! Static chain lookup table: identifier to display name, RPC endpoint,
//! gas price, fee denomination, and account address prefix.

use std::collections::HashMap;

use crate::domain::{ChainId, GasPrice};
use crate::error::WalletError;

/// Everything the workbench knows about one chain.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub chain_id: ChainId,
    pub display_name: &'static str,
    pub rpc: &'static str,
    pub gas_price_amount: &'static str,
    pub fee_denom: &'static str,
    pub address_prefix: &'static str,
}

impl ChainEntry {
    pub fn gas_price(&self) -> GasPrice {
        GasPrice::new(self.gas_price_amount, self.fee_denom)
    }
}

/// Registry of supported chains, constructed once at startup and handed to
/// whoever needs lookups. Identifiers absent from the table fail every
/// lookup with [`WalletError::UnknownChain`].
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    entries: HashMap<ChainId, ChainEntry>,
    order: Vec<ChainId>,
}

impl ChainRegistry {
    pub fn new(entries: Vec<ChainEntry>) -> Self {
        let order = entries.iter().map(|e| e.chain_id.clone()).collect();
        let entries = entries
            .into_iter()
            .map(|e| (e.chain_id.clone(), e))
            .collect();
        Self { entries, order }
    }

    /// The chains this build of the workbench ships with.
    pub fn with_default_chains() -> Self {
        Self::new(vec![
            ChainEntry {
                chain_id: ChainId::from("osmosis-1"),
                display_name: "Osmosis",
                rpc: "https://rpc.osmosis.zone",
                gas_price_amount: "0.0025",
                fee_denom: "uosmo",
                address_prefix: "osmo",
            },
            ChainEntry {
                chain_id: ChainId::from("juno-1"),
                display_name: "Juno",
                rpc: "https://juno-rpc.polkachu.com",
                gas_price_amount: "0.001",
                fee_denom: "ujuno",
                address_prefix: "juno",
            },
            ChainEntry {
                chain_id: ChainId::from("kaiyo-1"),
                display_name: "Kujira",
                rpc: "https://rpc.kaiyo.kujira.setten.io",
                gas_price_amount: "0.00119",
                fee_denom: "ukuji",
                address_prefix: "kujira",
            },
            ChainEntry {
                chain_id: ChainId::from("phoenix-1"),
                display_name: "Terra",
                rpc: "https://terra-rpc.publicnode.com",
                gas_price_amount: "0.015",
                fee_denom: "uluna",
                address_prefix: "terra",
            },
            ChainEntry {
                chain_id: ChainId::from("columbus-5"),
                display_name: "Terra Classic",
                rpc: "https://terra-classic-rpc.publicnode.com",
                gas_price_amount: "28.325",
                fee_denom: "uluna",
                address_prefix: "terra",
            },
            ChainEntry {
                chain_id: ChainId::from("neutron-1"),
                display_name: "Neutron",
                rpc: "https://neutron-rpc.polkachu.com",
                gas_price_amount: "0.01",
                fee_denom: "untrn",
                address_prefix: "neutron",
            },
        ])
    }

    pub fn entry(&self, chain_id: &ChainId) -> Result<&ChainEntry, WalletError> {
        self.entries
            .get(chain_id)
            .ok_or_else(|| WalletError::UnknownChain(chain_id.clone()))
    }

    pub fn display_name(&self, chain_id: &ChainId) -> Result<&'static str, WalletError> {
        Ok(self.entry(chain_id)?.display_name)
    }

    pub fn rpc(&self, chain_id: &ChainId) -> Result<&'static str, WalletError> {
        Ok(self.entry(chain_id)?.rpc)
    }

    pub fn gas_price(&self, chain_id: &ChainId) -> Result<GasPrice, WalletError> {
        Ok(self.entry(chain_id)?.gas_price())
    }

    pub fn fee_denom(&self, chain_id: &ChainId) -> Result<&'static str, WalletError> {
        Ok(self.entry(chain_id)?.fee_denom)
    }

    /// Chain identifiers in declaration order, for selector rendering.
    pub fn chain_ids(&self) -> impl Iterator<Item = &ChainId> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_seeded_chains_resolve() {
        let registry = ChainRegistry::with_default_chains();
        for chain_id in registry.chain_ids() {
            let entry = registry.entry(chain_id).expect("seeded chain");
            assert!(!entry.rpc.is_empty());
            assert!(!entry.fee_denom.is_empty());
            assert!(!entry.address_prefix.is_empty());
        }
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn unknown_chain_fails_every_lookup() {
        let registry = ChainRegistry::with_default_chains();
        let bogus = ChainId::from("atlantis-9");
        assert!(matches!(
            registry.entry(&bogus),
            Err(WalletError::UnknownChain(_))
        ));
        assert!(registry.rpc(&bogus).is_err());
        assert!(registry.gas_price(&bogus).is_err());
        assert!(registry.fee_denom(&bogus).is_err());
    }

    #[test]
    fn osmosis_entry_matches_published_values() {
        let registry = ChainRegistry::with_default_chains();
        let entry = registry.entry(&ChainId::from("osmosis-1")).expect("osmosis");
        assert_eq!(entry.display_name, "Osmosis");
        assert_eq!(entry.fee_denom, "uosmo");
        assert_eq!(entry.gas_price().amount, "0.0025");
        assert_eq!(entry.gas_price().denom, "uosmo");
    }

    #[test]
    fn terra_chains_share_a_denom_but_not_gas_price() {
        let registry = ChainRegistry::with_default_chains();
        let phoenix = registry.entry(&ChainId::from("phoenix-1")).expect("terra");
        let columbus = registry
            .entry(&ChainId::from("columbus-5"))
            .expect("terra classic");
        assert_eq!(phoenix.fee_denom, columbus.fee_denom);
        assert_ne!(phoenix.gas_price_amount, columbus.gas_price_amount);
    }
}
