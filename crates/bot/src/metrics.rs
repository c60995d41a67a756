use anyhow::Result;
use gallery_chain::ChannelMetrics;
use gallery_core::metrics::Metrics;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

pub struct BotMetrics {
    metrics: Metrics,
    pub pending: ChannelMetrics,
    pub delivery_queue: ChannelMetrics,
    pub delivery: DeliveryMetrics,
    pub hashes_total: IntCounter,
    pub dedup_hits: IntCounter,
    pub decode_rejects: IntCounterVec,
    pub filter_rejects: IntCounterVec,
    pub sales_total: IntCounter,
}

/// Counters handed to the delivery worker; a clone of registry-backed
/// counters so the worker needs no back-reference.
#[derive(Clone)]
pub struct DeliveryMetrics {
    posted_total: IntCounter,
    failures_total: IntCounterVec,
}

impl DeliveryMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let posted_total = IntCounter::with_opts(Opts::new(
            "salesbot_posted_total",
            "Total notifications delivered to the sink",
        ))?;
        registry.register(Box::new(posted_total.clone()))?;
        let failures_total = IntCounterVec::new(
            Opts::new(
                "salesbot_post_failures_total",
                "Total dropped notifications by failure kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;
        Ok(Self {
            posted_total,
            failures_total,
        })
    }

    pub fn inc_posted(&self) {
        self.posted_total.inc();
    }

    pub fn inc_failure(&self, kind: &str) {
        self.failures_total.with_label_values(&[kind]).inc();
    }
}

impl BotMetrics {
    pub fn new() -> Result<Self> {
        let metrics = Metrics::new();
        let registry = metrics.registry();
        let pending = ChannelMetrics::new(registry, "pending")?;
        let delivery_queue = ChannelMetrics::new(registry, "delivery")?;
        let delivery = DeliveryMetrics::new(registry)?;
        let hashes_total = IntCounter::with_opts(Opts::new(
            "salesbot_hashes_total",
            "Total pending tx hashes received",
        ))?;
        registry.register(Box::new(hashes_total.clone()))?;
        let dedup_hits = IntCounter::with_opts(Opts::new(
            "salesbot_dedup_hits_total",
            "Total sales suppressed as duplicates",
        ))?;
        registry.register(Box::new(dedup_hits.clone()))?;
        let decode_rejects = IntCounterVec::new(
            Opts::new(
                "salesbot_decode_rejects_total",
                "Total records rejected by the decoder, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(decode_rejects.clone()))?;
        let filter_rejects = IntCounterVec::new(
            Opts::new(
                "salesbot_filter_rejects_total",
                "Total candidates rejected by the filter, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(filter_rejects.clone()))?;
        let sales_total = IntCounter::with_opts(Opts::new(
            "salesbot_sales_total",
            "Total curated sales that produced a notification",
        ))?;
        registry.register(Box::new(sales_total.clone()))?;

        Ok(Self {
            metrics,
            pending,
            delivery_queue,
            delivery,
            hashes_total,
            dedup_hits,
            decode_rejects,
            filter_rejects,
            sales_total,
        })
    }

    pub fn gather(&self) -> String {
        self.metrics.gather()
    }
}

pub fn spawn_metrics_server(bind: &str, metrics: Arc<BotMetrics>) -> Result<()> {
    let listener = TcpListener::bind(bind)?;
    let bind = bind.to_string();
    thread::spawn(move || {
        info!(%bind, "metrics server listening");
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(err) = handle_connection(stream, &metrics) {
                        warn!(?err, "metrics server connection failed");
                    }
                }
                Err(err) => {
                    warn!(?err, "metrics server accept failed");
                }
            }
        }
    });
    Ok(())
}

fn handle_connection(mut stream: TcpStream, metrics: &BotMetrics) -> Result<()> {
    let mut buffer = [0u8; 512];
    let _ = stream.read(&mut buffer);
    let body = metrics.gather();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    Ok(())
}
