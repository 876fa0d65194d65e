//! Error types for booking domain validation and parsing.

use super::{BookingId, BookingStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating bookings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BookingDomainError {
    /// The service type is empty after trimming.
    #[error("service type must not be empty")]
    EmptyServiceType,

    /// The service type exceeds the persisted column width.
    #[error("service type is {length} characters, exceeds limit of {max}")]
    ServiceTypeTooLong {
        /// Actual length in characters.
        length: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// An appended note is empty after trimming.
    #[error("appended note must not be empty")]
    EmptyNote,

    /// The requested status edge is not in the transition table.
    #[error("booking {booking_id} cannot transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Booking being transitioned.
        booking_id: BookingId,
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// The booking is in a terminal status and its fields are frozen.
    #[error("booking {booking_id} is {status} and can no longer be edited")]
    BookingLocked {
        /// Booking being edited.
        booking_id: BookingId,
        /// Terminal status the booking is in.
        status: BookingStatus,
    },
}

/// Error returned while parsing booking statuses from storage or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown booking status: {0}")]
pub struct ParseBookingStatusError(pub String);

/// Error returned while parsing user roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown user role: {0}")]
pub struct ParseUserRoleError(pub String);
