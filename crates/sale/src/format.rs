use crate::filter::EnrichedSale;

/// Fixed notification template. Deterministic: the same enriched sale always
/// yields byte-identical text, so a retried delivery repeats the exact
/// payload.
pub fn format_notification(sale: &EnrichedSale) -> String {
    format!(
        "🔄 Art Blocks Curated Sale 🔄\n\n{} #{} sold for {:.2} ETH\n\n{}{}",
        sale.project_name,
        sale.candidate.token_number,
        sale.candidate.price_eth,
        sale.item_url,
        sale.candidate.token_id,
    )
}

#[cfg(test)]
mod tests {
    use super::format_notification;
    use crate::filter::EnrichedSale;
    use alloy::primitives::{address, B256};
    use gallery_core::types::SaleCandidate;

    fn sale() -> EnrichedSale {
        EnrichedSale {
            candidate: SaleCandidate {
                token_id: 3_000_042,
                project_id: 3,
                token_number: 42,
                price_eth: 1.25,
                marketplace: address!("0x7f268357a8c2552623316e2562d90e642bb538e5"),
                tx_hash: B256::repeat_byte(0x01),
            },
            project_name: "Art Blocks #3".to_string(),
            marketplace_name: "OpenSea".to_string(),
            item_url: "https://opensea.io/assets/ethereum/0xa7d8/".to_string(),
        }
    }

    #[test]
    fn renders_template() {
        let text = format_notification(&sale());
        assert!(text.contains("Art Blocks #3 #42"));
        assert!(text.contains("1.25 ETH"));
        assert!(text.ends_with("https://opensea.io/assets/ethereum/0xa7d8/3000042"));
    }

    #[test]
    fn repeat_formatting_is_byte_identical() {
        let sale = sale();
        assert_eq!(format_notification(&sale), format_notification(&sale));
    }

    #[test]
    fn price_rounds_to_two_decimals() {
        let mut sale = sale();
        sale.candidate.price_eth = 0.999;
        assert!(format_notification(&sale).contains("1.00 ETH"));
    }
}
