//! Queue-backed notification outbox and its delivery worker.
//!
//! [`ChannelOutbox`] accepts notifications with a non-blocking `try_send` on
//! a bounded channel. [`OutboxWorker`] drains the channel on its own task and
//! hands each notification to a [`NotificationDispatcher`], so a slow or
//! failing delivery channel never holds up a booking request.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::booking::ports::{
    BookingNotification, NotificationDispatcher, NotificationError, NotificationOutbox,
};

/// Producer side of the notification queue.
#[derive(Debug, Clone)]
pub struct ChannelOutbox {
    sender: mpsc::Sender<BookingNotification>,
}

/// Consumer side of the notification queue.
#[derive(Debug)]
pub struct OutboxQueue {
    receiver: mpsc::Receiver<BookingNotification>,
}

impl ChannelOutbox {
    /// Creates a bounded outbox and the queue a worker drains.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, OutboxQueue) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, OutboxQueue { receiver })
    }
}

impl NotificationOutbox for ChannelOutbox {
    fn publish(&self, notification: BookingNotification) -> Result<(), NotificationError> {
        self.sender.try_send(notification).map_err(|err| match err {
            TrySendError::Full(_) => NotificationError::QueueFull,
            TrySendError::Closed(_) => NotificationError::QueueClosed,
        })
    }
}

/// Background task delivering queued notifications.
pub struct OutboxWorker<N>
where
    N: NotificationDispatcher + ?Sized,
{
    queue: OutboxQueue,
    dispatcher: Arc<N>,
}

impl<N> OutboxWorker<N>
where
    N: NotificationDispatcher + ?Sized,
{
    /// Creates a worker draining `queue` into `dispatcher`.
    #[must_use]
    pub const fn new(queue: OutboxQueue, dispatcher: Arc<N>) -> Self {
        Self { queue, dispatcher }
    }

    /// Delivers notifications until every [`ChannelOutbox`] handle is
    /// dropped, returning the number delivered successfully.
    ///
    /// Delivery failures are logged and skipped; retries belong to the
    /// dispatcher.
    pub async fn run(mut self) -> u64 {
        info!("notification outbox worker started");
        let mut delivered: u64 = 0;
        while let Some(notification) = self.queue.receiver.recv().await {
            match self.dispatcher.notify(&notification).await {
                Ok(()) => {
                    delivered = delivered.saturating_add(1);
                    debug!(
                        recipient = %notification.recipient,
                        booking_id = %notification.related_entity_id,
                        "notification delivered"
                    );
                }
                Err(err) => warn!(
                    recipient = %notification.recipient,
                    booking_id = %notification.related_entity_id,
                    error = %err,
                    "notification delivery failed"
                ),
            }
        }
        info!(delivered, "notification outbox worker stopped");
        delivered
    }
}

/// Dispatcher that writes notifications to the log.
///
/// Stands in for the messaging subsystem when none is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError> {
        info!(
            recipient = %notification.recipient,
            booking_id = %notification.related_entity_id,
            title = %notification.title,
            "booking notification"
        );
        Ok(())
    }
}
