use crate::health::spawn_health_server;
use crate::metrics::{spawn_metrics_server, BotMetrics};
use crate::poster::SalePoster;
use crate::twitter::TwitterSink;
use alloy::primitives::{Address, B256};
use anyhow::Result;
use gallery_chain::{NodeClient, PendingTxStream, ReconnectConfig, TxFetcher};
use gallery_core::config::AppConfig;
use gallery_core::dedupe::DedupeCache;
use gallery_core::types::{Notification, PendingTx};
use gallery_core::utils::{now_ms, parse_address};
use gallery_sale::{decode_sale, format_notification, DecodeReject, Marketplaces, ProjectRegistry, RejectReason, SaleFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SUMMARY_INTERVAL_MS: u64 = 30_000;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const ANNOUNCE_TEXT: &str =
    "Art Blocks sales bot is now live! Monitoring Curated collection sales.";

/// Why a record produced no notification. All of these are per-record skips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    Decode(DecodeReject),
    Filter(RejectReason),
    Duplicate,
}

/// The per-record pipeline: decode, filter, dedupe, format. Pure apart from
/// the dedupe cache's check-and-insert.
pub struct Pipeline {
    contract: Address,
    filter: SaleFilter,
    dedupe: DedupeCache<B256>,
}

impl Pipeline {
    pub fn new(contract: Address, filter: SaleFilter, dedupe: DedupeCache<B256>) -> Self {
        Self {
            contract,
            filter,
            dedupe,
        }
    }

    pub fn marketplaces(&self) -> &Marketplaces {
        self.filter.marketplaces()
    }

    pub fn process(&self, tx: &PendingTx, now_ms: u64) -> Result<Notification, Skip> {
        let candidate = decode_sale(tx, self.contract).map_err(Skip::Decode)?;
        let sale = self.filter.evaluate(candidate).map_err(Skip::Filter)?;
        if !self.dedupe.check_and_update(sale.candidate.tx_hash, now_ms) {
            return Err(Skip::Duplicate);
        }
        info!(
            project = %sale.project_name,
            token_number = sale.candidate.token_number,
            price_eth = sale.candidate.price_eth,
            marketplace = %sale.marketplace_name,
            tx_hash = %sale.candidate.tx_hash,
            "curated sale detected"
        );
        Ok(Notification {
            text: format_notification(&sale),
            tx_hash: sale.candidate.tx_hash,
            created_ms: now_ms,
        })
    }
}

#[derive(Default, Clone, Copy)]
struct Counters {
    hashes_seen: u64,
    tx_missing: u64,
    tx_fetched: u64,
    decode_rejected: u64,
    filter_rejected: u64,
    dedupe_dropped: u64,
    sales: u64,
}

impl Counters {
    fn delta(&self, previous: &Counters) -> Counters {
        Counters {
            hashes_seen: self.hashes_seen.saturating_sub(previous.hashes_seen),
            tx_missing: self.tx_missing.saturating_sub(previous.tx_missing),
            tx_fetched: self.tx_fetched.saturating_sub(previous.tx_fetched),
            decode_rejected: self.decode_rejected.saturating_sub(previous.decode_rejected),
            filter_rejected: self.filter_rejected.saturating_sub(previous.filter_rejected),
            dedupe_dropped: self.dedupe_dropped.saturating_sub(previous.dedupe_dropped),
            sales: self.sales.saturating_sub(previous.sales),
        }
    }
}

struct CounterSummary {
    totals: Counters,
    last: Counters,
    last_log_ms: u64,
}

impl CounterSummary {
    fn new(now_ms: u64) -> Self {
        Self {
            totals: Counters::default(),
            last: Counters::default(),
            last_log_ms: now_ms,
        }
    }

    fn maybe_log(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_log_ms) < SUMMARY_INTERVAL_MS {
            return;
        }
        let delta = self.totals.delta(&self.last);
        self.last = self.totals;
        self.last_log_ms = now_ms;
        info!(
            hashes = delta.hashes_seen,
            tx_missing = delta.tx_missing,
            tx_fetched = delta.tx_fetched,
            decode_rejected = delta.decode_rejected,
            filter_rejected = delta.filter_rejected,
            dedupe_dropped = delta.dedupe_dropped,
            sales = delta.sales,
            "counter summary (last 30s)"
        );
    }
}

pub struct Bot {
    cfg: AppConfig,
    chain: Option<NodeClient>,
    fetcher: Option<TxFetcher>,
    pipeline: Pipeline,
    poster: SalePoster,
    poster_worker: Option<JoinHandle<()>>,
    metrics: Option<Arc<BotMetrics>>,
    counters: CounterSummary,
}

impl Bot {
    pub async fn new(cfg: AppConfig) -> Result<Self> {
        let contract = parse_address(&cfg.watch.contract)?;
        let registry = ProjectRegistry::from_config(&cfg.projects);
        let marketplaces = Marketplaces::from_config(&cfg.marketplaces)?;
        if marketplaces.is_empty() {
            warn!("no marketplaces configured; every candidate will be rejected");
        }
        let filter = SaleFilter::new(registry, marketplaces, cfg.watch.min_price_eth);
        let dedupe = DedupeCache::new(cfg.watch.dedup_capacity, cfg.watch.dedup_ttl_ms);
        let pipeline = Pipeline::new(contract, filter, dedupe);

        let metrics = if cfg.observability.metrics_enabled {
            let metrics = Arc::new(BotMetrics::new()?);
            if let Err(err) = spawn_metrics_server(&cfg.observability.metrics_bind, metrics.clone())
            {
                warn!(?err, "metrics server failed to start");
            }
            Some(metrics)
        } else {
            None
        };

        let (poster, poster_worker) = match TwitterSink::from_env() {
            Some(sink) => {
                info!("twitter posting enabled");
                let (poster, worker) = SalePoster::spawn(
                    sink,
                    &cfg.delivery,
                    metrics.as_ref().map(|m| m.delivery_queue.clone()),
                    metrics.as_ref().map(|m| m.delivery.clone()),
                );
                (poster, Some(worker))
            }
            None => {
                warn!("twitter credentials absent; running without posting");
                (SalePoster::disabled(), None)
            }
        };

        let chain = match NodeClient::connect(&cfg.chain).await {
            Ok(chain) => Some(chain),
            Err(err) => {
                warn!(?err, "chain connection failed; monitoring disabled");
                None
            }
        };
        let fetcher = chain.as_ref().map(|chain| {
            TxFetcher::new(
                chain.http.clone(),
                cfg.watch.tx_fetch_timeout_ms,
                cfg.watch.tx_fetch_attempts,
                ReconnectConfig::new(cfg.watch.tx_fetch_retry_base_ms, cfg.watch.tx_fetch_timeout_ms),
            )
        });

        Ok(Self {
            cfg,
            chain,
            fetcher,
            pipeline,
            poster,
            poster_worker,
            metrics,
            counters: CounterSummary::new(now_ms()),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        spawn_health_server(&self.cfg.server.health_bind)?;

        if self.cfg.delivery.announce_on_start && self.poster.is_enabled() {
            self.poster.enqueue(Notification {
                text: ANNOUNCE_TEXT.to_string(),
                tx_hash: B256::ZERO,
                created_ms: now_ms(),
            });
        }

        let Some(chain) = self.chain.clone() else {
            info!("running degraded: health endpoint only");
            tokio::signal::ctrl_c().await?;
            self.shutdown(None).await;
            return Ok(());
        };

        let reconnect = ReconnectConfig::new(
            self.cfg.watch.ws_reconnect_base_ms,
            self.cfg.watch.ws_reconnect_max_ms,
        );
        let stream = PendingTxStream::new(
            chain.ws.clone(),
            self.cfg.watch.pending_channel_size,
            reconnect,
            self.metrics.as_ref().map(|m| m.pending.clone()),
        );
        let (mut hashes, subscription) = stream.spawn()?;
        info!(
            contract = %self.cfg.watch.contract,
            marketplaces = self.pipeline.marketplaces().len(),
            min_price_eth = self.cfg.watch.min_price_eth,
            "watching for curated sales"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown signal received");
                    break;
                }
                maybe_hash = hashes.recv() => {
                    match maybe_hash {
                        Some(hash) => {
                            if let Err(err) = self.process_hash(hash).await {
                                warn!(?err, %hash, "record processing failed; continuing");
                            }
                            self.counters.maybe_log(now_ms());
                        }
                        None => {
                            warn!("pending hash channel closed");
                            break;
                        }
                    }
                }
            }
        }

        self.shutdown(Some(subscription)).await;
        Ok(())
    }

    /// Per-record processing. Every failure path returns instead of
    /// propagating a panic, so one bad record never stops the stream.
    async fn process_hash(&mut self, hash: B256) -> Result<()> {
        self.counters.totals.hashes_seen += 1;
        if let Some(metrics) = &self.metrics {
            metrics.hashes_total.inc();
        }

        let Some(fetcher) = &self.fetcher else {
            return Ok(());
        };
        let Some(tx) = fetcher.fetch(hash).await? else {
            self.counters.totals.tx_missing += 1;
            return Ok(());
        };
        self.counters.totals.tx_fetched += 1;

        match self.pipeline.process(&tx, now_ms()) {
            Ok(notification) => {
                self.counters.totals.sales += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.sales_total.inc();
                }
                self.poster.enqueue(notification);
            }
            Err(Skip::Decode(reject)) => {
                self.counters.totals.decode_rejected += 1;
                if let Some(metrics) = &self.metrics {
                    metrics
                        .decode_rejects
                        .with_label_values(&[reject.as_str()])
                        .inc();
                }
                debug!(%hash, reason = reject.as_str(), "not a decodable sale");
            }
            Err(Skip::Filter(reason)) => {
                self.counters.totals.filter_rejected += 1;
                if let Some(metrics) = &self.metrics {
                    metrics
                        .filter_rejects
                        .with_label_values(&[reason.as_str()])
                        .inc();
                }
                debug!(%hash, reason = reason.as_str(), "sale filtered");
            }
            Err(Skip::Duplicate) => {
                self.counters.totals.dedupe_dropped += 1;
                if let Some(metrics) = &self.metrics {
                    metrics.dedup_hits.inc();
                }
                debug!(%hash, "duplicate sale suppressed");
            }
        }
        Ok(())
    }

    async fn shutdown(&mut self, subscription: Option<JoinHandle<()>>) {
        if let Some(subscription) = subscription {
            subscription.abort();
        }
        self.poster.close();
        if let Some(mut worker) = self.poster_worker.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut worker).await.is_err() {
                warn!("delivery queue did not drain within grace period; aborting");
                worker.abort();
            }
        }
        info!("shutdown complete");
    }
}
