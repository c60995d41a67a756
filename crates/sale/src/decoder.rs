use alloy::primitives::{Address, U256};
use gallery_core::types::{PendingTx, SaleCandidate};
use gallery_core::utils::wei_to_eth;

/// Token ids pack `project_id * 1_000_000 + token_number`.
pub const PROJECT_SPAN: u64 = 1_000_000;

// The marketplace purchase call carries the token id as the second 32-byte
// argument word: 4-byte selector, one word, then the id.
const TOKEN_ID_OFFSET: usize = 36;
const WORD_BYTES: usize = 32;

/// Why a pending transaction is not a decodable sale. These are normal
/// filtering outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReject {
    MissingTo,
    OtherContract,
    CalldataTooShort,
    TokenIdOverflow,
}

impl DecodeReject {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeReject::MissingTo => "missing_to",
            DecodeReject::OtherContract => "other_contract",
            DecodeReject::CalldataTooShort => "calldata_too_short",
            DecodeReject::TokenIdOverflow => "token_id_overflow",
        }
    }
}

/// Pure, idempotent decode of a pending transaction into a sale candidate.
/// Calldata length is validated before the fixed-offset slice.
pub fn decode_sale(tx: &PendingTx, contract: Address) -> Result<SaleCandidate, DecodeReject> {
    let to = tx.to.ok_or(DecodeReject::MissingTo)?;
    if to != contract {
        return Err(DecodeReject::OtherContract);
    }

    let input = tx.input.as_ref();
    let end = TOKEN_ID_OFFSET + WORD_BYTES;
    if input.len() < end {
        return Err(DecodeReject::CalldataTooShort);
    }

    let word = U256::from_be_slice(&input[TOKEN_ID_OFFSET..end]);
    if word > U256::from(u64::MAX) {
        return Err(DecodeReject::TokenIdOverflow);
    }
    let token_id = word.to::<u64>();

    Ok(SaleCandidate {
        token_id,
        project_id: token_id / PROJECT_SPAN,
        token_number: token_id % PROJECT_SPAN,
        price_eth: wei_to_eth(tx.value),
        marketplace: tx.from,
        tx_hash: tx.hash,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_sale, DecodeReject, PROJECT_SPAN};
    use alloy::primitives::{address, Address, Bytes, B256, U256};
    use gallery_core::types::PendingTx;

    const CONTRACT: Address = address!("0xa7d8d9ef8D8Ce8992Df33D8b8CF4Aebabd5bD270");
    const MARKET: Address = address!("0x7f268357a8c2552623316e2562d90e642bb538e5");

    fn calldata_with_token_id(token_id: u64) -> Bytes {
        let mut data = vec![0u8; 68];
        data[..4].copy_from_slice(&[0xfb, 0x16, 0xa5, 0x95]);
        data[36..68].copy_from_slice(&U256::from(token_id).to_be_bytes::<32>());
        Bytes::from(data)
    }

    fn sale_tx(token_id: u64, value_wei: u128) -> PendingTx {
        PendingTx {
            hash: B256::repeat_byte(0x11),
            from: MARKET,
            to: Some(CONTRACT),
            input: calldata_with_token_id(token_id),
            value: U256::from(value_wei),
            first_seen_ms: 0,
        }
    }

    #[test]
    fn decodes_token_id_and_price() {
        let tx = sale_tx(3_000_042, 1_250_000_000_000_000_000);
        let sale = decode_sale(&tx, CONTRACT).unwrap();
        assert_eq!(sale.token_id, 3_000_042);
        assert_eq!(sale.project_id, 3);
        assert_eq!(sale.token_number, 42);
        assert!((sale.price_eth - 1.25).abs() < 1e-9);
        assert_eq!(sale.marketplace, MARKET);
    }

    #[test]
    fn token_id_split_roundtrips() {
        for token_id in [0u64, 42, 999_999, 1_000_000, 3_000_042, 487_000_123] {
            let tx = sale_tx(token_id, 0);
            let sale = decode_sale(&tx, CONTRACT).unwrap();
            assert_eq!(sale.project_id * PROJECT_SPAN + sale.token_number, token_id);
            assert!(sale.token_number < PROJECT_SPAN);
        }
    }

    #[test]
    fn decode_is_pure() {
        let tx = sale_tx(7_000_001, 900_000_000_000_000_000);
        let first = decode_sale(&tx, CONTRACT).unwrap();
        let second = decode_sale(&tx, CONTRACT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_missing_to() {
        let mut tx = sale_tx(1, 0);
        tx.to = None;
        assert_eq!(decode_sale(&tx, CONTRACT), Err(DecodeReject::MissingTo));
    }

    #[test]
    fn rejects_other_contract() {
        let mut tx = sale_tx(1, 0);
        tx.to = Some(MARKET);
        assert_eq!(decode_sale(&tx, CONTRACT), Err(DecodeReject::OtherContract));
    }

    #[test]
    fn rejects_short_calldata() {
        let mut tx = sale_tx(1, 0);
        tx.input = Bytes::from(vec![0u8; 40]);
        assert_eq!(decode_sale(&tx, CONTRACT), Err(DecodeReject::CalldataTooShort));
    }

    #[test]
    fn rejects_token_id_overflow() {
        let mut tx = sale_tx(1, 0);
        let mut data = vec![0u8; 68];
        data[36..68].copy_from_slice(&U256::MAX.to_be_bytes::<32>());
        tx.input = Bytes::from(data);
        assert_eq!(decode_sale(&tx, CONTRACT), Err(DecodeReject::TokenIdOverflow));
    }
}
