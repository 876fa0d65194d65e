//! Request and response shapes for the booking service.

use crate::booking::domain::{
    BookingDomainError, BookingPatch, ServiceBooking, ServiceType, TractorId, UserId,
};
use chrono::{DateTime, Utc};

/// Request payload for creating a booking.
///
/// The scheduled date is optional here so that a missing date surfaces as a
/// validation failure from the service rather than a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBookingRequest {
    pub(crate) service_type: String,
    pub(crate) scheduled_date: Option<DateTime<Utc>>,
    pub(crate) tractor_id: Option<TractorId>,
    pub(crate) description: Option<String>,
    pub(crate) service_provider_id: Option<UserId>,
    pub(crate) notes: Option<String>,
}

impl CreateBookingRequest {
    /// Creates a request for the given service type.
    #[must_use]
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            scheduled_date: None,
            tractor_id: None,
            description: None,
            service_provider_id: None,
            notes: None,
        }
    }

    /// Sets the requested service date.
    #[must_use]
    pub const fn scheduled_for(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(scheduled_date);
        self
    }

    /// Sets the tractor needing service.
    #[must_use]
    pub const fn with_tractor(mut self, tractor_id: TractorId) -> Self {
        self.tractor_id = Some(tractor_id);
        self
    }

    /// Sets the customer's description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the preferred provider.
    #[must_use]
    pub const fn with_service_provider(mut self, provider_id: UserId) -> Self {
        self.service_provider_id = Some(provider_id);
        self
    }

    /// Sets initial notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Request payload for editing the non-status fields of a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBookingRequest {
    service_type: Option<String>,
    description: Option<Option<String>>,
    scheduled_date: Option<DateTime<Utc>>,
    tractor_id: Option<Option<TractorId>>,
    service_provider_id: Option<Option<UserId>>,
    notes: Option<String>,
    append_note: Option<String>,
}

impl UpdateBookingRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the service type.
    #[must_use]
    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    /// Removes the description.
    #[must_use]
    pub fn without_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    /// Reschedules the booking.
    #[must_use]
    pub const fn with_scheduled_date(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(scheduled_date);
        self
    }

    /// Points the booking at another tractor.
    #[must_use]
    pub const fn with_tractor(mut self, tractor_id: TractorId) -> Self {
        self.tractor_id = Some(Some(tractor_id));
        self
    }

    /// Drops the tractor link.
    #[must_use]
    pub const fn without_tractor(mut self) -> Self {
        self.tractor_id = Some(None);
        self
    }

    /// Assigns a provider.
    #[must_use]
    pub const fn with_service_provider(mut self, provider_id: UserId) -> Self {
        self.service_provider_id = Some(Some(provider_id));
        self
    }

    /// Unassigns the provider.
    #[must_use]
    pub const fn without_service_provider(mut self) -> Self {
        self.service_provider_id = Some(None);
        self
    }

    /// Replaces the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Appends a line to the notes.
    #[must_use]
    pub fn with_appended_note(mut self, note: impl Into<String>) -> Self {
        self.append_note = Some(note.into());
        self
    }

    /// Validates the request and converts it into a domain patch.
    ///
    /// # Errors
    ///
    /// Returns [`BookingDomainError`] when the service type or the appended
    /// note is blank.
    pub fn into_patch(self) -> Result<BookingPatch, BookingDomainError> {
        let Self {
            service_type,
            description,
            scheduled_date,
            tractor_id,
            service_provider_id,
            notes,
            append_note,
        } = self;

        let mut patch = BookingPatch::new();
        if let Some(value) = service_type {
            patch = patch.with_service_type(ServiceType::new(value)?);
        }
        patch = match description {
            Some(Some(value)) => patch.with_description(value),
            Some(None) => patch.without_description(),
            None => patch,
        };
        if let Some(value) = scheduled_date {
            patch = patch.with_scheduled_date(value);
        }
        patch = match tractor_id {
            Some(Some(value)) => patch.with_tractor(value),
            Some(None) => patch.without_tractor(),
            None => patch,
        };
        patch = match service_provider_id {
            Some(Some(value)) => patch.with_service_provider(value),
            Some(None) => patch.without_service_provider(),
            None => patch,
        };
        if let Some(value) = notes {
            patch = patch.with_notes(value);
        }
        if let Some(note) = append_note {
            patch = patch.with_appended_note(note)?;
        }
        Ok(patch)
    }
}

/// Paging and perspective options for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListBookingsQuery {
    /// Number of leading bookings to skip.
    pub skip: usize,
    /// Requested page size; the service default applies when absent.
    pub limit: Option<usize>,
    /// Lists bookings assigned to a provider instead of those they requested.
    pub view_as_provider: bool,
}

impl ListBookingsQuery {
    /// Creates a query for the first page with the default size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips the first `skip` bookings.
    #[must_use]
    pub const fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Requests a page of `limit` bookings.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Lists from the provider's perspective.
    #[must_use]
    pub const fn as_provider(mut self) -> Self {
        self.view_as_provider = true;
        self
    }
}

/// Result of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// An administrator removed the booking permanently.
    Deleted,
    /// The customer withdrew the booking; it is kept for history.
    Cancelled(ServiceBooking),
}
