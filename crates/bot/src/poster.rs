use crate::metrics::DeliveryMetrics;
use async_trait::async_trait;
use gallery_chain::channel::{tracked_channel, EnqueueOutcome, TrackedReceiver, TrackedSender};
use gallery_chain::metrics::ChannelMetrics;
use gallery_chain::reconnect::ReconnectConfig;
use gallery_core::config::DeliveryConfig;
use gallery_core::types::Notification;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Classified posting failure. Transient errors are retried with backoff;
/// permanent ones drop the notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    Transient(String),
    Permanent(String),
}

#[async_trait]
pub trait PostSink: Send + Sync {
    async fn post(&self, text: &str) -> Result<(), PostError>;
}

struct WorkerConfig {
    min_interval: Duration,
    max_attempts: u32,
    retry: ReconnectConfig,
}

impl WorkerConfig {
    fn from(cfg: &DeliveryConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(cfg.min_interval_ms),
            max_attempts: cfg.max_attempts.max(1),
            retry: ReconnectConfig::new(cfg.retry_base_ms, cfg.retry_max_ms),
        }
    }
}

/// Bounded delivery queue in front of the posting sink. The single worker
/// task is the only writer to the sink, spacing posts by the configured
/// interval. Without a sink (missing credentials) it runs disabled and only
/// logs what would have been posted.
pub struct SalePoster {
    sender: Option<TrackedSender<Notification>>,
}

impl SalePoster {
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn spawn<S: PostSink + 'static>(
        sink: S,
        cfg: &DeliveryConfig,
        queue_metrics: Option<ChannelMetrics>,
        delivery_metrics: Option<DeliveryMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = tracked_channel(cfg.queue_capacity, queue_metrics);
        let worker = tokio::spawn(run_worker(
            sink,
            receiver,
            WorkerConfig::from(cfg),
            delivery_metrics,
        ));
        (
            Self {
                sender: Some(sender),
            },
            worker,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn enqueue(&self, notification: Notification) {
        let Some(sender) = &self.sender else {
            info!(text = %notification.text, "delivery disabled; would post");
            return;
        };
        let tx_hash = notification.tx_hash;
        match sender.enqueue(notification) {
            EnqueueOutcome::Queued => {}
            EnqueueOutcome::DroppedFull => {
                warn!(%tx_hash, "delivery queue full; dropping notification");
            }
            EnqueueOutcome::Closed => {
                warn!(%tx_hash, "delivery queue closed; dropping notification");
            }
        }
    }

    /// Closes the queue; the worker drains what is buffered and exits.
    pub fn close(&mut self) {
        self.sender = None;
    }
}

async fn run_worker<S: PostSink>(
    sink: S,
    mut receiver: TrackedReceiver<Notification>,
    cfg: WorkerConfig,
    metrics: Option<DeliveryMetrics>,
) {
    let mut last_post: Option<Instant> = None;

    while let Some(notification) = receiver.recv().await {
        if let Some(last) = last_post {
            let elapsed = last.elapsed();
            if elapsed < cfg.min_interval {
                sleep(cfg.min_interval - elapsed).await;
            }
        }

        deliver(&sink, &notification, &cfg, metrics.as_ref()).await;
        last_post = Some(Instant::now());
    }
}

async fn deliver(
    sink: &impl PostSink,
    notification: &Notification,
    cfg: &WorkerConfig,
    metrics: Option<&DeliveryMetrics>,
) {
    let mut backoff = cfg.retry.backoff();
    for attempt in 1..=cfg.max_attempts {
        match sink.post(&notification.text).await {
            Ok(()) => {
                debug!(tx_hash = %notification.tx_hash, attempt, "notification posted");
                if let Some(metrics) = metrics {
                    metrics.inc_posted();
                }
                return;
            }
            Err(PostError::Permanent(reason)) => {
                warn!(
                    %reason,
                    tx_hash = %notification.tx_hash,
                    "permanent delivery failure; dropping"
                );
                if let Some(metrics) = metrics {
                    metrics.inc_failure("permanent");
                }
                return;
            }
            Err(PostError::Transient(reason)) => {
                if attempt == cfg.max_attempts {
                    warn!(
                        %reason,
                        tx_hash = %notification.tx_hash,
                        attempts = attempt,
                        "delivery retries exhausted; dropping"
                    );
                    if let Some(metrics) = metrics {
                        metrics.inc_failure("exhausted");
                    }
                    return;
                }
                debug!(%reason, attempt, "transient delivery failure; retrying");
                sleep(backoff.next_delay()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PostError, PostSink, SalePoster};
    use async_trait::async_trait;
    use gallery_core::config::DeliveryConfig;
    use gallery_core::types::Notification;
    use alloy::primitives::B256;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    struct ScriptedSink {
        transient_failures: AtomicU32,
        permanent: bool,
        posted: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PostSink for ScriptedSink {
        async fn post(&self, text: &str) -> Result<(), PostError> {
            if self.permanent {
                return Err(PostError::Permanent("auth rejected".to_string()));
            }
            let remaining = self.transient_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.transient_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(PostError::Transient("rate limited".to_string()));
            }
            self.posted.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn fast_config() -> DeliveryConfig {
        DeliveryConfig {
            queue_capacity: 8,
            min_interval_ms: 1,
            max_attempts: 4,
            retry_base_ms: 1,
            retry_max_ms: 4,
            announce_on_start: false,
        }
    }

    fn notification(text: &str) -> Notification {
        Notification {
            text: text.to_string(),
            tx_hash: B256::repeat_byte(0x22),
            created_ms: 0,
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_to_single_delivery() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let sink = ScriptedSink {
            transient_failures: AtomicU32::new(3),
            permanent: false,
            posted: posted.clone(),
        };
        let (mut poster, worker) = SalePoster::spawn(sink, &fast_config(), None, None);
        poster.enqueue(notification("sale"));
        poster.close();
        worker.await.unwrap();
        assert_eq!(posted.lock().unwrap().as_slice(), ["sale"]);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let sink = ScriptedSink {
            transient_failures: AtomicU32::new(0),
            permanent: true,
            posted: posted.clone(),
        };
        let (mut poster, worker) = SalePoster::spawn(sink, &fast_config(), None, None);
        poster.enqueue(notification("sale"));
        poster.close();
        worker.await.unwrap();
        assert!(posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn queue_drains_in_order_on_close() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let sink = ScriptedSink {
            transient_failures: AtomicU32::new(0),
            permanent: false,
            posted: posted.clone(),
        };
        let (mut poster, worker) = SalePoster::spawn(sink, &fast_config(), None, None);
        poster.enqueue(notification("one"));
        poster.enqueue(notification("two"));
        poster.close();
        worker.await.unwrap();
        assert_eq!(posted.lock().unwrap().as_slice(), ["one", "two"]);
    }

    #[tokio::test]
    async fn disabled_poster_accepts_enqueues() {
        let poster = SalePoster::disabled();
        assert!(!poster.is_enabled());
        poster.enqueue(notification("sale"));
    }
}
