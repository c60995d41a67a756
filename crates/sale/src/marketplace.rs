use alloy::primitives::Address;
use anyhow::Result;
use gallery_core::config::MarketplaceConfig;
use gallery_core::utils::parse_address;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marketplace {
    pub name: String,
    pub item_url: String,
}

/// Known marketplace counterparties, read-only after startup.
pub struct Marketplaces {
    map: HashMap<Address, Marketplace>,
}

impl Marketplaces {
    pub fn from_config(entries: &[MarketplaceConfig]) -> Result<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            let address = parse_address(&entry.address)?;
            map.insert(
                address,
                Marketplace {
                    name: entry.name.clone(),
                    item_url: entry.item_url.clone(),
                },
            );
        }
        Ok(Self { map })
    }

    pub fn lookup(&self, address: Address) -> Option<&Marketplace> {
        self.map.get(&address)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Marketplaces;
    use alloy::primitives::address;
    use gallery_core::config::MarketplaceConfig;

    #[test]
    fn lookup_is_case_insensitive_via_parsing() {
        let entries = vec![MarketplaceConfig {
            address: "0x7F268357A8C2552623316E2562D90E642BB538E5".to_string(),
            name: "OpenSea".to_string(),
            item_url: "https://opensea.io/assets/ethereum/0xa7d8/".to_string(),
        }];
        let marketplaces = Marketplaces::from_config(&entries).unwrap();
        let addr = address!("0x7f268357a8c2552623316e2562d90e642bb538e5");
        assert_eq!(marketplaces.lookup(addr).unwrap().name, "OpenSea");
    }

    #[test]
    fn invalid_address_is_an_error() {
        let entries = vec![MarketplaceConfig {
            address: "not-an-address".to_string(),
            name: "Broken".to_string(),
            item_url: String::new(),
        }];
        assert!(Marketplaces::from_config(&entries).is_err());
    }
}
