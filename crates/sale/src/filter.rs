use crate::marketplace::Marketplaces;
use crate::registry::ProjectRegistry;
use gallery_core::types::SaleCandidate;

/// First failing check wins; rejects are skip outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotCurated,
    BelowMinimumPrice,
    UnknownMarketplace,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotCurated => "not_curated",
            RejectReason::BelowMinimumPrice => "below_min_price",
            RejectReason::UnknownMarketplace => "unknown_marketplace",
        }
    }
}

/// Candidate that passed every check, with the resolved metadata the
/// formatter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSale {
    pub candidate: SaleCandidate,
    pub project_name: String,
    pub marketplace_name: String,
    pub item_url: String,
}

pub struct SaleFilter {
    registry: ProjectRegistry,
    marketplaces: Marketplaces,
    min_price_eth: f64,
}

impl SaleFilter {
    pub fn new(registry: ProjectRegistry, marketplaces: Marketplaces, min_price_eth: f64) -> Self {
        Self {
            registry,
            marketplaces,
            min_price_eth,
        }
    }

    pub fn marketplaces(&self) -> &Marketplaces {
        &self.marketplaces
    }

    pub fn evaluate(&self, candidate: SaleCandidate) -> Result<EnrichedSale, RejectReason> {
        let project = self
            .registry
            .lookup(candidate.project_id)
            .filter(|p| p.curated)
            .ok_or(RejectReason::NotCurated)?;

        if candidate.price_eth < self.min_price_eth {
            return Err(RejectReason::BelowMinimumPrice);
        }

        let marketplace = self
            .marketplaces
            .lookup(candidate.marketplace)
            .ok_or(RejectReason::UnknownMarketplace)?;

        Ok(EnrichedSale {
            project_name: project.name,
            marketplace_name: marketplace.name.clone(),
            item_url: marketplace.item_url.clone(),
            candidate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{RejectReason, SaleFilter};
    use crate::marketplace::Marketplaces;
    use crate::registry::ProjectRegistry;
    use alloy::primitives::{address, Address, B256};
    use gallery_core::config::{MarketplaceConfig, ProjectConfig, ProjectsConfig};
    use gallery_core::types::SaleCandidate;

    const MARKET: Address = address!("0x7f268357a8c2552623316e2562d90e642bb538e5");

    fn filter(assume_curated: bool) -> SaleFilter {
        let registry = ProjectRegistry::from_config(&ProjectsConfig {
            assume_curated,
            curated: vec![ProjectConfig {
                id: 3,
                name: "Cryptoblots".to_string(),
                curated: true,
            }],
        });
        let marketplaces = Marketplaces::from_config(&[MarketplaceConfig {
            address: format!("{MARKET}"),
            name: "OpenSea".to_string(),
            item_url: "https://opensea.io/assets/ethereum/0xa7d8/".to_string(),
        }])
        .unwrap();
        SaleFilter::new(registry, marketplaces, 0.5)
    }

    fn candidate(project_id: u64, price_eth: f64, marketplace: Address) -> SaleCandidate {
        SaleCandidate {
            token_id: project_id * 1_000_000 + 42,
            project_id,
            token_number: 42,
            price_eth,
            marketplace,
            tx_hash: B256::repeat_byte(0xab),
        }
    }

    #[test]
    fn passing_sale_is_enriched() {
        let sale = filter(false).evaluate(candidate(3, 1.25, MARKET)).unwrap();
        assert_eq!(sale.project_name, "Cryptoblots");
        assert_eq!(sale.marketplace_name, "OpenSea");
    }

    #[test]
    fn below_minimum_price_rejected() {
        assert_eq!(
            filter(false).evaluate(candidate(3, 0.1, MARKET)),
            Err(RejectReason::BelowMinimumPrice)
        );
    }

    #[test]
    fn unknown_marketplace_rejected() {
        let other = address!("0x59728544b08ab483533076417fbbb2fd0b17ce3a");
        assert_eq!(
            filter(false).evaluate(candidate(3, 1.0, other)),
            Err(RejectReason::UnknownMarketplace)
        );
    }

    #[test]
    fn curated_check_wins_over_price() {
        // fails both the curated and the price check; first check decides
        assert_eq!(
            filter(false).evaluate(candidate(99, 0.1, MARKET)),
            Err(RejectReason::NotCurated)
        );
    }
}
