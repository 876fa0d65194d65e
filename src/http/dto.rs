//! Wire shapes for the booking endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::booking::{
    domain::{BookingStatus, TractorId, UserId},
    services::{CreateBookingRequest, ListBookingsQuery, UpdateBookingRequest},
};

use super::ApiError;

/// Body of `POST /service-bookings`.
///
/// Required fields are optional here so that their absence is reported by
/// the service as a validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingBody {
    /// Requested service.
    pub service_type: Option<String>,
    /// Requested service date.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// Tractor needing service.
    pub tractor_id: Option<TractorId>,
    /// Free-text detail.
    pub description: Option<String>,
    /// Preferred provider.
    pub service_provider_id: Option<UserId>,
    /// Initial notes.
    pub notes: Option<String>,
}

impl CreateBookingBody {
    /// Converts the body into a service request.
    #[must_use]
    pub fn into_request(self) -> CreateBookingRequest {
        let mut request = CreateBookingRequest::new(self.service_type.unwrap_or_default());
        if let Some(date) = self.scheduled_date {
            request = request.scheduled_for(date);
        }
        if let Some(tractor_id) = self.tractor_id {
            request = request.with_tractor(tractor_id);
        }
        if let Some(description) = self.description {
            request = request.with_description(description);
        }
        if let Some(provider_id) = self.service_provider_id {
            request = request.with_service_provider(provider_id);
        }
        if let Some(notes) = self.notes {
            request = request.with_notes(notes);
        }
        request
    }
}

/// Reads a field where an explicit `null` differs from an absent key.
///
/// Paired with `#[serde(default)]`: absent yields `None`, `null` yields
/// `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `PUT /service-bookings/{id}`.
///
/// Status is not editable here; unknown fields, `status` included, are
/// rejected. `null` clears the description, tractor, or provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBookingBody {
    /// New service type.
    pub service_type: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// New service date.
    pub scheduled_date: Option<DateTime<Utc>>,
    /// New tractor.
    #[serde(default, deserialize_with = "nullable")]
    pub tractor_id: Option<Option<TractorId>>,
    /// Provider to assign.
    #[serde(default, deserialize_with = "nullable")]
    pub service_provider_id: Option<Option<UserId>>,
    /// Replacement notes.
    pub notes: Option<String>,
    /// Line appended to the notes.
    pub append_note: Option<String>,
}

impl UpdateBookingBody {
    /// Converts the body into a service request.
    #[must_use]
    pub fn into_request(self) -> UpdateBookingRequest {
        let mut request = UpdateBookingRequest::new();
        if let Some(value) = self.service_type {
            request = request.with_service_type(value);
        }
        request = match self.description {
            Some(Some(value)) => request.with_description(value),
            Some(None) => request.without_description(),
            None => request,
        };
        if let Some(value) = self.scheduled_date {
            request = request.with_scheduled_date(value);
        }
        request = match self.tractor_id {
            Some(Some(value)) => request.with_tractor(value),
            Some(None) => request.without_tractor(),
            None => request,
        };
        request = match self.service_provider_id {
            Some(Some(value)) => request.with_service_provider(value),
            Some(None) => request.without_service_provider(),
            None => request,
        };
        if let Some(value) = self.notes {
            request = request.with_notes(value);
        }
        if let Some(value) = self.append_note {
            request = request.with_appended_note(value);
        }
        request
    }
}

/// Body of `PATCH /service-bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeBody {
    /// Requested status, in its snake_case form.
    pub status: String,
}

impl StatusChangeBody {
    /// Parses the requested status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::BadRequest`] for an unknown status.
    pub fn target(&self) -> Result<BookingStatus, ApiError> {
        BookingStatus::try_from(self.status.as_str())
            .map_err(|err| ApiError::BadRequest(err.to_string()))
    }
}

/// Query string of the listing endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListParams {
    /// Bookings to skip.
    pub skip: Option<usize>,
    /// Page size.
    pub limit: Option<usize>,
    /// Provider perspective toggle.
    pub view_as_provider: Option<bool>,
}

impl From<ListParams> for ListBookingsQuery {
    fn from(params: ListParams) -> Self {
        Self {
            skip: params.skip.unwrap_or_default(),
            limit: params.limit,
            view_as_provider: params.view_as_provider.unwrap_or_default(),
        }
    }
}

/// Body returned by the tractor purge endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeResponse {
    /// Number of bookings removed.
    pub removed: u64,
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
}
