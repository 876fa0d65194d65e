//! Service booking aggregate root and its field patch.

use super::{BookingDomainError, BookingId, BookingStatus, TractorId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Short description of the requested service, e.g. "600-hour maintenance".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceType(String);

impl ServiceType {
    /// Largest service type representable in the current `PostgreSQL` schema.
    pub const MAX_LENGTH: usize = 255;

    /// Creates a validated service type.
    ///
    /// # Errors
    ///
    /// Returns [`BookingDomainError::EmptyServiceType`] when the value is
    /// blank and [`BookingDomainError::ServiceTypeTooLong`] when it exceeds
    /// [`Self::MAX_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, BookingDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookingDomainError::EmptyServiceType);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(BookingDomainError::ServiceTypeTooLong {
                length,
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the service type as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Parameter object for creating a booking on behalf of a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Customer making the request.
    pub customer_id: UserId,
    /// Tractor the service concerns, if any.
    pub tractor_id: Option<TractorId>,
    /// Requested service.
    pub service_type: ServiceType,
    /// Free-text detail from the customer.
    pub description: Option<String>,
    /// Requested service date.
    pub scheduled_date: DateTime<Utc>,
    /// Preferred or assigned provider.
    pub service_provider_id: Option<UserId>,
    /// Initial notes.
    pub notes: Option<String>,
}

/// Parameter object for reconstructing a persisted booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedBookingData {
    /// Persisted booking identifier.
    pub id: BookingId,
    /// Persisted customer reference.
    pub customer_id: UserId,
    /// Persisted tractor reference.
    pub tractor_id: Option<TractorId>,
    /// Persisted service type.
    pub service_type: ServiceType,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted scheduled date.
    pub scheduled_date: DateTime<Utc>,
    /// Persisted status.
    pub status: BookingStatus,
    /// Persisted provider reference.
    pub service_provider_id: Option<UserId>,
    /// Persisted notes.
    pub notes: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Service booking aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBooking {
    id: BookingId,
    customer_id: UserId,
    tractor_id: Option<TractorId>,
    service_type: ServiceType,
    description: Option<String>,
    scheduled_date: DateTime<Utc>,
    status: BookingStatus,
    service_provider_id: Option<UserId>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceBooking {
    /// Creates a new pending booking.
    #[must_use]
    pub fn new(data: NewBooking, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: BookingId::new(),
            customer_id: data.customer_id,
            tractor_id: data.tractor_id,
            service_type: data.service_type,
            description: data.description,
            scheduled_date: data.scheduled_date,
            status: BookingStatus::Pending,
            service_provider_id: data.service_provider_id,
            notes: data.notes,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a booking from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedBookingData) -> Self {
        Self {
            id: data.id,
            customer_id: data.customer_id,
            tractor_id: data.tractor_id,
            service_type: data.service_type,
            description: data.description,
            scheduled_date: data.scheduled_date,
            status: data.status,
            service_provider_id: data.service_provider_id,
            notes: data.notes,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the booking identifier.
    #[must_use]
    pub const fn id(&self) -> BookingId {
        self.id
    }

    /// Returns the customer who requested the service.
    #[must_use]
    pub const fn customer_id(&self) -> UserId {
        self.customer_id
    }

    /// Returns the tractor the service concerns, if any.
    #[must_use]
    pub const fn tractor_id(&self) -> Option<TractorId> {
        self.tractor_id
    }

    /// Returns the requested service type.
    #[must_use]
    pub const fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    /// Returns the customer's description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the scheduled service date.
    #[must_use]
    pub const fn scheduled_date(&self) -> DateTime<Utc> {
        self.scheduled_date
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> BookingStatus {
        self.status
    }

    /// Returns the assigned provider, if any.
    #[must_use]
    pub const fn service_provider_id(&self) -> Option<UserId> {
        self.service_provider_id
    }

    /// Returns the accumulated notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the booking to `target`.
    ///
    /// Only edges present in [`BookingStatus::allowed_targets`] are taken;
    /// the booking is left untouched otherwise. Who may request an edge is
    /// decided separately by [`super::access`].
    ///
    /// # Errors
    ///
    /// Returns [`BookingDomainError::InvalidStatusTransition`] for any edge
    /// outside the transition table, including self-loops.
    pub fn apply_transition(
        &mut self,
        target: BookingStatus,
        clock: &impl Clock,
    ) -> Result<(), BookingDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(BookingDomainError::InvalidStatusTransition {
                booking_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Applies a field patch.
    ///
    /// # Errors
    ///
    /// Returns [`BookingDomainError::BookingLocked`] when the booking is in a
    /// terminal status.
    pub fn apply_patch(
        &mut self,
        patch: BookingPatch,
        clock: &impl Clock,
    ) -> Result<(), BookingDomainError> {
        if self.status.is_terminal() {
            return Err(BookingDomainError::BookingLocked {
                booking_id: self.id,
                status: self.status,
            });
        }

        let BookingPatch {
            service_type,
            description,
            scheduled_date,
            tractor_id,
            service_provider_id,
            notes,
            appended_note,
        } = patch;

        if let Some(value) = service_type {
            self.service_type = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = scheduled_date {
            self.scheduled_date = value;
        }
        if let Some(value) = tractor_id {
            self.tractor_id = value;
        }
        if let Some(value) = service_provider_id {
            self.service_provider_id = value;
        }
        if let Some(value) = notes {
            self.notes = Some(value);
        }
        if let Some(note) = appended_note {
            self.notes = Some(match self.notes.take() {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
                _ => note,
            });
        }

        self.touch(clock);
        Ok(())
    }

    /// Overwrites status and `updated_at` with values already accepted by
    /// storage.
    pub(crate) const fn record_status(&mut self, status: BookingStatus, updated_at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = updated_at;
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Set of non-status field changes for a booking.
///
/// Absent values leave the corresponding field unchanged. Nullable fields
/// carry an inner `None` when the patch clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    service_type: Option<ServiceType>,
    description: Option<Option<String>>,
    scheduled_date: Option<DateTime<Utc>>,
    tractor_id: Option<Option<TractorId>>,
    service_provider_id: Option<Option<UserId>>,
    notes: Option<String>,
    appended_note: Option<String>,
}

impl BookingPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the service type.
    #[must_use]
    pub fn with_service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = Some(service_type);
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
    pub fn with_scheduled_date(mut self, scheduled_date: DateTime<Utc>) -> Self {
        self.scheduled_date = Some(scheduled_date);
        self
    }

    /// Points the booking at a different tractor.
    #[must_use]
    pub fn with_tractor(mut self, tractor_id: TractorId) -> Self {
        self.tractor_id = Some(Some(tractor_id));
        self
    }

    /// Drops the tractor link.
    #[must_use]
    pub fn without_tractor(mut self) -> Self {
        self.tractor_id = Some(None);
        self
    }

    /// Assigns a service provider.
    #[must_use]
    pub fn with_service_provider(mut self, provider_id: UserId) -> Self {
        self.service_provider_id = Some(Some(provider_id));
        self
    }

    /// Unassigns the service provider.
    #[must_use]
    pub fn without_service_provider(mut self) -> Self {
        self.service_provider_id = Some(None);
        self
    }

    /// Replaces the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Appends a line to the existing notes.
    ///
    /// # Errors
    ///
    /// Returns [`BookingDomainError::EmptyNote`] when the note is blank.
    pub fn with_appended_note(
        mut self,
        note: impl Into<String>,
    ) -> Result<Self, BookingDomainError> {
        let raw = note.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BookingDomainError::EmptyNote);
        }
        self.appended_note = Some(trimmed.to_owned());
        Ok(self)
    }

    /// Returns `true` when the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.service_type.is_none()
            && self.description.is_none()
            && self.scheduled_date.is_none()
            && self.tractor_id.is_none()
            && self.service_provider_id.is_none()
            && self.notes.is_none()
            && self.appended_note.is_none()
    }

    /// Returns the tractor the patch points the booking at, if any.
    #[must_use]
    pub fn tractor_id(&self) -> Option<TractorId> {
        self.tractor_id.flatten()
    }

    /// Returns the provider the patch assigns, if any.
    #[must_use]
    pub fn service_provider_id(&self) -> Option<UserId> {
        self.service_provider_id.flatten()
    }

    /// Returns `true` when the patch assigns or unassigns a provider.
    #[must_use]
    pub const fn changes_provider(&self) -> bool {
        self.service_provider_id.is_some()
    }

    /// Returns `true` when the patch appends to the notes.
    #[must_use]
    pub const fn appends_note(&self) -> bool {
        self.appended_note.is_some()
    }
}
