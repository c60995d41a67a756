use alloy::primitives::{Address, Bytes, B256, U256};

/// Pending transaction as fetched from the provider. One processing pass,
/// never mutated.
#[derive(Debug, Clone)]
pub struct PendingTx {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub input: Bytes,
    pub value: U256,
    pub first_seen_ms: u64,
}

/// Decoded token-sale call. `project_id * 1_000_000 + token_number == token_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleCandidate {
    pub token_id: u64,
    pub project_id: u64,
    pub token_number: u64,
    pub price_eth: f64,
    pub marketplace: Address,
    pub tx_hash: B256,
}

/// Formatted notification pending delivery. Owned by the delivery queue
/// until posted or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    pub tx_hash: B256,
    pub created_ms: u64,
}
