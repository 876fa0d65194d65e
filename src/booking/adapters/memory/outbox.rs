//! Outbox that records notifications instead of delivering them.

use std::sync::{Arc, Mutex};

use crate::booking::ports::{BookingNotification, NotificationError, NotificationOutbox};

/// Outbox capturing every published notification for later inspection.
///
/// A rejecting outbox refuses every notification, which lets tests confirm
/// that publication failures never undo a committed booking change.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutbox {
    published: Arc<Mutex<Vec<BookingNotification>>>,
    reject_with: Option<NotificationError>,
}

impl RecordingOutbox {
    /// Creates an outbox that accepts every notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outbox that rejects every notification with `error`.
    #[must_use]
    pub fn rejecting(error: NotificationError) -> Self {
        Self {
            published: Arc::default(),
            reject_with: Some(error),
        }
    }

    /// Returns the notifications accepted so far.
    #[must_use]
    pub fn published(&self) -> Vec<BookingNotification> {
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl NotificationOutbox for RecordingOutbox {
    fn publish(&self, notification: BookingNotification) -> Result<(), NotificationError> {
        if let Some(error) = &self.reject_with {
            return Err(error.clone());
        }
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
        Ok(())
    }
}
