use crate::reconnect::ReconnectConfig;
use alloy::consensus::Transaction as TransactionTrait;
use alloy::network::TransactionResponse;
use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider};
use anyhow::Result;
use gallery_core::types::PendingTx;
use gallery_core::utils::now_ms;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Looks up full transaction detail for a pending hash. Transient RPC
/// failures and timeouts are retried with backoff up to a bounded attempt
/// count, then the record is skipped.
#[derive(Clone)]
pub struct TxFetcher {
    provider: DynProvider,
    timeout: Duration,
    attempts: u32,
    retry: ReconnectConfig,
}

impl TxFetcher {
    pub fn new(provider: DynProvider, timeout_ms: u64, attempts: u32, retry: ReconnectConfig) -> Self {
        Self {
            provider,
            timeout: Duration::from_millis(timeout_ms),
            attempts: attempts.max(1),
            retry,
        }
    }

    pub async fn fetch(&self, hash: B256) -> Result<Option<PendingTx>> {
        let mut backoff = self.retry.backoff();
        for attempt in 1..=self.attempts {
            let fut = self.provider.get_transaction_by_hash(hash);
            match tokio::time::timeout(self.timeout, fut).await {
                Ok(Ok(tx_opt)) => return Ok(tx_opt.map(|tx| Self::map_tx(tx, now_ms()))),
                Ok(Err(err)) => {
                    warn!(?err, %hash, attempt, "tx fetch failed");
                }
                Err(_) => {
                    warn!(
                        %hash,
                        attempt,
                        timeout_ms = self.timeout.as_millis(),
                        "tx fetch timeout"
                    );
                }
            }
            if attempt < self.attempts {
                sleep(backoff.next_delay()).await;
            }
        }
        warn!(%hash, attempts = self.attempts, "tx fetch exhausted retries; skipping");
        Ok(None)
    }

    fn map_tx<T>(tx: T, first_seen_ms: u64) -> PendingTx
    where
        T: TransactionTrait + TransactionResponse,
    {
        PendingTx {
            hash: tx.tx_hash(),
            from: tx.from(),
            to: tx.to(),
            input: tx.input().clone(),
            value: tx.value(),
            first_seen_ms,
        }
    }
}
