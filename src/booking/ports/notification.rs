//! Outbound notification ports.
//!
//! Status changes are announced through a [`NotificationOutbox`], which must
//! accept or reject a notification without waiting. Delivery happens later,
//! off the request path, through a [`NotificationDispatcher`].

use crate::booking::domain::{BookingId, BookingStatus, ServiceBooking, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entity type recorded on booking notifications.
pub const SERVICE_BOOKING_ENTITY: &str = "service_booking";

/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A booking was confirmed, started, completed, or cancelled.
    ServiceStatusUpdate,
}

/// A message for one recipient about one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingNotification {
    /// User the notification is addressed to.
    pub recipient: UserId,
    /// Short headline.
    pub title: String,
    /// Human-readable body.
    pub message: String,
    /// Notification category.
    pub kind: NotificationKind,
    /// Entity type the notification refers to.
    pub related_entity_type: String,
    /// Booking the notification refers to.
    pub related_entity_id: BookingId,
}

impl BookingNotification {
    /// Builds a status-change notice for `recipient`.
    #[must_use]
    pub fn status_changed(
        recipient: UserId,
        booking: &ServiceBooking,
        previous: BookingStatus,
    ) -> Self {
        Self {
            recipient,
            title: format!("Service booking {}", booking.status()),
            message: format!(
                "Your {} booking scheduled for {} moved from {} to {}.",
                booking.service_type().as_str(),
                booking.scheduled_date().format("%Y-%m-%d %H:%M UTC"),
                previous,
                booking.status(),
            ),
            kind: NotificationKind::ServiceStatusUpdate,
            related_entity_type: SERVICE_BOOKING_ENTITY.to_owned(),
            related_entity_id: booking.id(),
        }
    }
}

/// Non-blocking hand-off point for notifications.
pub trait NotificationOutbox: Send + Sync {
    /// Queues a notification for later delivery.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the notification cannot be queued.
    fn publish(&self, notification: BookingNotification) -> Result<(), NotificationError>;
}

/// Delivery channel for queued notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError::Delivery`] when the channel rejects it.
    async fn notify(&self, notification: &BookingNotification) -> Result<(), NotificationError>;
}

/// Errors raised while queueing or delivering notifications.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    /// The outbox queue is at capacity.
    #[error("notification queue is full")]
    QueueFull,

    /// The outbox worker has shut down.
    #[error("notification queue is closed")]
    QueueClosed,

    /// The delivery channel rejected the notification.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
