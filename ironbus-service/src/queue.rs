/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Notification queue between transport callbacks and service loops.
//!
//! Transport listeners run on the transport's delivery path and only enqueue.
//! A service loop drains the queue on its own task. Cancelling the paired
//! token wakes a blocked receiver and makes further enqueues fail.

use ironbus_core::message::MappedMessage;
use ironbus_core::types::LostMessageStatus;
use ironbus_transport::MessageListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace};

/// Creates an unbounded notification queue tied to a cancellation token.
#[must_use]
pub fn notification_queue<T>(
    cancel: CancellationToken,
) -> (NotificationSender<T>, NotificationReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        NotificationSender {
            tx,
            cancel: cancel.clone(),
        },
        NotificationReceiver { rx, cancel },
    )
}

/// Producer side of a notification queue.
#[derive(Debug)]
pub struct NotificationSender<T> {
    tx: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
}

impl<T> Clone for NotificationSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> NotificationSender<T> {
    /// Enqueues an item without blocking.
    ///
    /// # Returns
    /// `false` if the queue was cancelled or the receiver is gone.
    pub fn enqueue(&self, item: T) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(item).is_ok()
    }

    /// Returns true once the queue has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Consumer side of a notification queue.
#[derive(Debug)]
pub struct NotificationReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    cancel: CancellationToken,
}

impl<T> NotificationReceiver<T> {
    /// Waits for the next item.
    ///
    /// Returns `None` once the queue is cancelled, even if items remain.
    pub async fn recv(&mut self) -> Option<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            item = self.rx.recv() => {
                if self.cancel.is_cancelled() {
                    None
                } else {
                    item
                }
            }
        }
    }

    /// Drops every queued item.
    ///
    /// # Returns
    /// The number of items dropped.
    pub fn clear(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Returns true once the queue has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Transport listener that forwards every delivered message into a queue.
///
/// Lost-message reports are logged and counted.
pub(crate) struct QueueingListener {
    service: &'static str,
    topic: String,
    sender: NotificationSender<MappedMessage>,
    lost: Arc<AtomicU64>,
}

impl QueueingListener {
    pub(crate) fn new(
        service: &'static str,
        topic: impl Into<String>,
        sender: NotificationSender<MappedMessage>,
        lost: Arc<AtomicU64>,
    ) -> Self {
        Self {
            service,
            topic: topic.into(),
            sender,
            lost,
        }
    }
}

impl MessageListener for QueueingListener {
    fn on_new_message(&self, message: MappedMessage) {
        if !self.sender.enqueue(message) {
            trace!(service = self.service, topic = %self.topic, "queue closed, message dropped");
        }
    }

    fn on_message_lost(&self, status: LostMessageStatus) {
        self.lost.fetch_add(status.new_lost, Ordering::Relaxed);
        error!(
            service = self.service,
            topic = %self.topic,
            total_lost = status.total_lost,
            new_lost = status.new_lost,
            reason = %status.reason,
            "messages lost"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = notification_queue(CancellationToken::new());
        for i in 0..3 {
            assert!(tx.enqueue(i));
        }
        assert_eq!(rx.recv().await, Some(0));
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn test_cancel_unblocks_receiver() {
        let cancel = CancellationToken::new();
        let (_tx, mut rx) = notification_queue::<u32>(cancel.clone());

        let waiter = tokio::spawn(async move { rx.recv().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        assert_eq!(waiter.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancelled_queue_rejects_and_hides_items() {
        let cancel = CancellationToken::new();
        let (tx, mut rx) = notification_queue(cancel.clone());
        assert!(tx.enqueue("queued"));

        cancel.cancel();
        assert!(!tx.enqueue("late"));
        assert!(tx.is_cancelled());
        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.clear(), 1);
    }

    #[tokio::test]
    async fn test_clear_drains() {
        let (tx, mut rx) = notification_queue(CancellationToken::new());
        tx.enqueue(1);
        tx.enqueue(2);
        assert_eq!(rx.clear(), 2);
        assert_eq!(rx.clear(), 0);
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (tx, rx) = notification_queue(CancellationToken::new());
        drop(rx);
        assert!(!tx.enqueue(5));
    }

    #[test]
    fn test_queueing_listener_counts_losses() {
        let (tx, mut rx) = notification_queue(CancellationToken::new());
        let lost = Arc::new(AtomicU64::new(0));
        let listener = QueueingListener::new("Test", "Info", tx, Arc::clone(&lost));

        listener.on_new_message(MappedMessage::from_schema("Empty", &[]).unwrap());
        listener.on_message_lost(LostMessageStatus::new(4, 4, "overrun"));
        assert_eq!(lost.load(Ordering::Relaxed), 4);
        assert_eq!(rx.clear(), 1);
    }
}
