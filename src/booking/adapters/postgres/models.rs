//! Diesel row models for booking persistence.

use super::schema::{service_bookings, tractors};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for booking records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = service_bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    /// Booking identifier.
    pub id: uuid::Uuid,
    /// Customer reference.
    pub customer_id: uuid::Uuid,
    /// Tractor reference.
    pub tractor_id: Option<uuid::Uuid>,
    /// Requested service.
    pub service_type: String,
    /// Customer description.
    pub description: Option<String>,
    /// Scheduled service date.
    pub scheduled_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Provider reference.
    pub service_provider_id: Option<uuid::Uuid>,
    /// Notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for booking records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = service_bookings)]
pub struct NewBookingRow {
    /// Booking identifier.
    pub id: uuid::Uuid,
    /// Customer reference.
    pub customer_id: uuid::Uuid,
    /// Tractor reference.
    pub tractor_id: Option<uuid::Uuid>,
    /// Requested service.
    pub service_type: String,
    /// Customer description.
    pub description: Option<String>,
    /// Scheduled service date.
    pub scheduled_date: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Provider reference.
    pub service_provider_id: Option<uuid::Uuid>,
    /// Notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset for conditional field edits.
///
/// `None` clears the column, so every editable field is written on update.
/// Status is left to the dedicated status write.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = service_bookings)]
#[diesel(treat_none_as_null = true)]
pub struct BookingChangeset {
    /// Tractor reference.
    pub tractor_id: Option<uuid::Uuid>,
    /// Requested service.
    pub service_type: String,
    /// Customer description.
    pub description: Option<String>,
    /// Scheduled service date.
    pub scheduled_date: DateTime<Utc>,
    /// Provider reference.
    pub service_provider_id: Option<uuid::Uuid>,
    /// Notes.
    pub notes: Option<String>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for mirrored tractor ownership.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = tractors)]
pub struct TractorRow {
    /// Tractor identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
}
