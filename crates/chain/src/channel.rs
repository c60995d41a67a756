use crate::metrics::ChannelMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outcome of a non-blocking enqueue. A full queue is signaled to the caller
/// instead of silently losing the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    DroppedFull,
    Closed,
}

pub struct TrackedSender<T> {
    sender: mpsc::Sender<T>,
    len: Arc<AtomicUsize>,
    metrics: Option<ChannelMetrics>,
}

pub struct TrackedReceiver<T> {
    receiver: mpsc::Receiver<T>,
    len: Arc<AtomicUsize>,
    metrics: Option<ChannelMetrics>,
}

pub fn tracked_channel<T>(
    capacity: usize,
    metrics: Option<ChannelMetrics>,
) -> (TrackedSender<T>, TrackedReceiver<T>) {
    let (sender, receiver) = mpsc::channel(capacity);
    let len = Arc::new(AtomicUsize::new(0));
    let sender = TrackedSender {
        sender,
        len: len.clone(),
        metrics: metrics.clone(),
    };
    let receiver = TrackedReceiver {
        receiver,
        len,
        metrics,
    };
    (sender, receiver)
}

impl<T> TrackedSender<T> {
    pub fn enqueue(&self, value: T) -> EnqueueOutcome {
        match self.sender.try_send(value) {
            Ok(()) => {
                let len = self.len.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(metrics) = &self.metrics {
                    metrics.set_queue_depth(len);
                }
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_dropped();
                }
                EnqueueOutcome::DroppedFull
            }
            Err(TrySendError::Closed(_)) => EnqueueOutcome::Closed,
        }
    }
}

impl<T> Clone for TrackedSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            len: self.len.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T> TrackedReceiver<T> {
    pub async fn recv(&mut self) -> Option<T> {
        let item = self.receiver.recv().await;
        if item.is_some() {
            let _ = self
                .len
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                    value.checked_sub(1)
                });
        }
        let len = self.len.load(Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.set_queue_depth(len);
        }
        item
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{tracked_channel, EnqueueOutcome};

    #[tokio::test]
    async fn enqueue_tracks_depth() {
        let (tx, mut rx) = tracked_channel(2, None);
        assert_eq!(rx.len(), 0);

        assert_eq!(tx.enqueue(1), EnqueueOutcome::Queued);
        assert_eq!(rx.len(), 1);

        let _ = rx.recv().await;
        assert_eq!(rx.len(), 0);
    }

    #[tokio::test]
    async fn full_queue_signals_drop() {
        let (tx, rx) = tracked_channel(1, None);
        assert_eq!(tx.enqueue(1), EnqueueOutcome::Queued);
        assert_eq!(tx.enqueue(2), EnqueueOutcome::DroppedFull);
        drop(rx);
        assert_eq!(tx.enqueue(3), EnqueueOutcome::Closed);
    }
}
