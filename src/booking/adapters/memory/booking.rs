//! In-memory repository for booking lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::booking::{
    domain::{BookingId, BookingStatus, ServiceBooking, TractorId},
    ports::{
        BookingFilter, BookingRepository, BookingRepositoryError, BookingRepositoryResult,
        BookingRevision, Page,
    },
};

/// Thread-safe in-memory booking repository.
///
/// Conditional updates compare and write under a single write guard, so two
/// writers racing from the same observed state cannot both succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<BookingId, ServiceBooking>>>,
}

impl InMemoryBookingRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> BookingRepositoryError {
    BookingRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Orders bookings newest scheduled date first, then by identifier.
fn sort_for_listing(bookings: &mut [ServiceBooking]) {
    bookings.sort_by(|left, right| {
        right
            .scheduled_date()
            .cmp(&left.scheduled_date())
            .then_with(|| left.id().cmp(&right.id()))
    });
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn store(&self, booking: &ServiceBooking) -> BookingRepositoryResult<()> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        if bookings.contains_key(&booking.id()) {
            return Err(BookingRepositoryError::DuplicateBooking(booking.id()));
        }
        bookings.insert(booking.id(), booking.clone());
        Ok(())
    }

    async fn update(
        &self,
        booking: &ServiceBooking,
        observed: BookingRevision,
    ) -> BookingRepositoryResult<()> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        let stored = bookings
            .get_mut(&booking.id())
            .ok_or(BookingRepositoryError::NotFound(booking.id()))?;

        if stored.status() != observed.status {
            return Err(BookingRepositoryError::StatusConflict {
                booking_id: booking.id(),
                expected: observed.status,
                actual: stored.status(),
            });
        }
        if stored.updated_at() != observed.updated_at {
            return Err(BookingRepositoryError::StaleRevision(booking.id()));
        }

        let status = stored.status();
        *stored = booking.clone();
        stored.record_status(status, booking.updated_at());
        Ok(())
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingRepositoryResult<ServiceBooking> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        let stored = bookings
            .get_mut(&id)
            .ok_or(BookingRepositoryError::NotFound(id))?;

        if stored.status() != expected {
            return Err(BookingRepositoryError::StatusConflict {
                booking_id: id,
                expected,
                actual: stored.status(),
            });
        }

        stored.record_status(target, updated_at);
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: BookingId) -> BookingRepositoryResult<Option<ServiceBooking>> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        Ok(bookings.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: BookingFilter,
        page: Page,
    ) -> BookingRepositoryResult<Vec<ServiceBooking>> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        let mut selected: Vec<ServiceBooking> = bookings
            .values()
            .filter(|booking| filter.matches(booking))
            .cloned()
            .collect();
        drop(bookings);

        sort_for_listing(&mut selected);
        Ok(selected
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn delete(&self, id: BookingId) -> BookingRepositoryResult<()> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(BookingRepositoryError::NotFound(id))
    }

    async fn delete_by_tractor(&self, tractor_id: TractorId) -> BookingRepositoryResult<u64> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        let before = bookings.len();
        bookings.retain(|_, booking| booking.tractor_id() != Some(tractor_id));
        let removed = before - bookings.len();
        u64::try_from(removed).map_err(BookingRepositoryError::persistence)
    }
}
