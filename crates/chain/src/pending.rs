use crate::channel::{tracked_channel, EnqueueOutcome, TrackedReceiver};
use crate::metrics::ChannelMetrics;
use crate::reconnect::ReconnectConfig;
use alloy::primitives::B256;
use alloy::providers::{DynProvider, Provider};
use anyhow::Result;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Connection lifecycle of the pending-transaction subscription. Transport
/// errors cycle through `Reconnecting`; they never tear the task down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connected,
    Subscribed,
    Reconnecting,
}

pub struct PendingTxStream {
    provider: DynProvider,
    channel_size: usize,
    reconnect: ReconnectConfig,
    metrics: Option<ChannelMetrics>,
}

impl PendingTxStream {
    pub fn new(
        provider: DynProvider,
        channel_size: usize,
        reconnect: ReconnectConfig,
        metrics: Option<ChannelMetrics>,
    ) -> Self {
        Self {
            provider,
            channel_size,
            reconnect,
            metrics,
        }
    }

    /// Spawns the subscription task. Hashes arrive on the returned receiver;
    /// the handle aborts the subscription on shutdown.
    pub fn spawn(self) -> Result<(TrackedReceiver<B256>, JoinHandle<()>)> {
        let (tx, rx) = tracked_channel(self.channel_size, self.metrics.clone());
        let provider = self.provider;
        let mut backoff = self.reconnect.backoff();

        let handle = tokio::spawn(async move {
            let mut state = StreamState::Disconnected;
            loop {
                transition(&mut state, StreamState::Connected);
                let sub = match provider.subscribe_pending_transactions().await {
                    Ok(sub) => {
                        backoff.reset();
                        transition(&mut state, StreamState::Subscribed);
                        sub
                    }
                    Err(err) => {
                        error!(?err, "pending subscription failed");
                        transition(&mut state, StreamState::Reconnecting);
                        sleep(backoff.next_delay()).await;
                        continue;
                    }
                };

                let mut stream = sub.into_stream();
                while let Some(hash) = stream.next().await {
                    match tx.enqueue(hash) {
                        EnqueueOutcome::Queued => {}
                        EnqueueOutcome::DroppedFull => {
                            warn!(%hash, "pending queue full; dropping hash");
                        }
                        EnqueueOutcome::Closed => {
                            info!("pending stream receiver dropped; stopping");
                            return;
                        }
                    }
                }

                warn!("pending subscription ended; reconnecting");
                transition(&mut state, StreamState::Reconnecting);
                sleep(backoff.next_delay()).await;
            }
        });

        Ok((rx, handle))
    }
}

fn transition(state: &mut StreamState, next: StreamState) {
    if *state != next {
        debug!(from = ?state, to = ?next, "stream state");
        *state = next;
    }
}
