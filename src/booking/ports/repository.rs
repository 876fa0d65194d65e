//! Repository port for booking persistence and lookup.

use crate::booking::domain::{BookingId, BookingStatus, ServiceBooking, TractorId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for booking repository operations.
pub type BookingRepositoryResult<T> = Result<T, BookingRepositoryError>;

/// Selects which bookings a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    /// Every booking.
    All,
    /// Bookings requested by the given customer.
    Customer(UserId),
    /// Bookings assigned to the given provider.
    Provider(UserId),
    /// Bookings concerning the given tractor.
    Tractor(TractorId),
}

impl BookingFilter {
    /// Returns `true` when `booking` belongs to this selection.
    #[must_use]
    pub fn matches(&self, booking: &ServiceBooking) -> bool {
        match *self {
            Self::All => true,
            Self::Customer(id) => booking.customer_id() == id,
            Self::Provider(id) => booking.service_provider_id() == Some(id),
            Self::Tractor(id) => booking.tractor_id() == Some(id),
        }
    }
}

/// Offset/limit window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of leading records to skip.
    pub offset: usize,
    /// Maximum number of records to return.
    pub limit: usize,
}

impl Page {
    /// Creates a page window.
    #[must_use]
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

/// Stored state a writer observed before editing a booking.
///
/// A field write only lands while the stored booking still carries both
/// values; any committed change in between moves `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingRevision {
    /// Observed lifecycle status.
    pub status: BookingStatus,
    /// Observed latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl BookingRevision {
    /// Captures the revision of a loaded booking.
    #[must_use]
    pub const fn of(booking: &ServiceBooking) -> Self {
        Self {
            status: booking.status(),
            updated_at: booking.updated_at(),
        }
    }
}

/// Booking persistence contract.
///
/// Listings are ordered by scheduled date, newest first, with the booking
/// identifier as a tie-breaker.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Stores a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingRepositoryError::DuplicateBooking`] when the booking
    /// ID already exists.
    async fn store(&self, booking: &ServiceBooking) -> BookingRepositoryResult<()>;

    /// Persists the non-status fields of an existing booking, provided the
    /// stored booking is still at `observed`.
    ///
    /// The stored status is never written here.
    ///
    /// # Errors
    ///
    /// Returns [`BookingRepositoryError::NotFound`] when the booking does not
    /// exist, [`BookingRepositoryError::StatusConflict`] when its stored
    /// status differs from the observed one, and
    /// [`BookingRepositoryError::StaleRevision`] when another write landed
    /// at the same status.
    async fn update(
        &self,
        booking: &ServiceBooking,
        observed: BookingRevision,
    ) -> BookingRepositoryResult<()>;

    /// Moves a booking from `expected` to `target`, stamping `updated_at`,
    /// and returns the stored booking after the write.
    ///
    /// Only the status and `updated_at` columns are written, so field edits
    /// committed since the caller read the booking survive.
    ///
    /// # Errors
    ///
    /// Returns [`BookingRepositoryError::NotFound`] when the booking does not
    /// exist and [`BookingRepositoryError::StatusConflict`] when its stored
    /// status differs from `expected`.
    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingRepositoryResult<ServiceBooking>;

    /// Finds a booking by identifier.
    ///
    /// Returns `None` when the booking does not exist.
    async fn find_by_id(&self, id: BookingId) -> BookingRepositoryResult<Option<ServiceBooking>>;

    /// Returns one page of the bookings selected by `filter`.
    async fn list(
        &self,
        filter: BookingFilter,
        page: Page,
    ) -> BookingRepositoryResult<Vec<ServiceBooking>>;

    /// Permanently removes a booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingRepositoryError::NotFound`] when the booking does not
    /// exist.
    async fn delete(&self, id: BookingId) -> BookingRepositoryResult<()>;

    /// Removes every booking that references `tractor_id`, returning how
    /// many were removed.
    async fn delete_by_tractor(&self, tractor_id: TractorId) -> BookingRepositoryResult<u64>;
}

/// Errors returned by booking repository implementations.
#[derive(Debug, Clone, Error)]
pub enum BookingRepositoryError {
    /// A booking with the same identifier already exists.
    #[error("duplicate booking identifier: {0}")]
    DuplicateBooking(BookingId),

    /// The booking was not found.
    #[error("booking not found: {0}")]
    NotFound(BookingId),

    /// The stored status changed since it was read.
    #[error("booking {booking_id} is {actual}, expected {expected}")]
    StatusConflict {
        /// Booking being written.
        booking_id: BookingId,
        /// Status observed by the writer.
        expected: BookingStatus,
        /// Status currently stored.
        actual: BookingStatus,
    },

    /// The booking was written by someone else since it was read.
    #[error("booking {0} changed since it was read")]
    StaleRevision(BookingId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BookingRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
