use alloy::primitives::{Address, B256, U256};
use anyhow::anyhow;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

const WEI_PER_ETH: f64 = 1e18;

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn parse_address(s: &str) -> anyhow::Result<Address> {
    Address::from_str(s.trim()).map_err(|e| anyhow!("invalid address {s}: {e}"))
}

pub fn parse_b256(s: &str) -> anyhow::Result<B256> {
    let stripped = s.trim().trim_start_matches("0x");
    B256::from_str(stripped).map_err(|e| anyhow!("invalid b256 {s}: {e}"))
}

/// Accepts 0x-prefixed hex or plain decimal.
pub fn parse_u256(s: &str) -> anyhow::Result<U256> {
    let s = s.trim();
    if let Some(stripped) = s.strip_prefix("0x") {
        Ok(U256::from_str_radix(stripped, 16)?)
    } else {
        Ok(U256::from_str_radix(s, 10)?)
    }
}

/// Wei to ETH for display. Saturates above u128::MAX wei, far beyond any
/// real sale price.
pub fn wei_to_eth(value: U256) -> f64 {
    value.saturating_to::<u128>() as f64 / WEI_PER_ETH
}

#[cfg(test)]
mod tests {
    use super::wei_to_eth;
    use alloy::primitives::U256;

    #[test]
    fn wei_to_eth_half() {
        let half = U256::from(500_000_000_000_000_000u128);
        assert!((wei_to_eth(half) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn wei_to_eth_zero() {
        assert_eq!(wei_to_eth(U256::ZERO), 0.0);
    }
}
