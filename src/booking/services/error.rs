//! Errors surfaced by the booking service.

use crate::booking::{
    domain::{BookingDomainError, BookingStatus},
    ports::{BookingRepositoryError, DirectoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for booking operations.
#[derive(Debug, Clone, Error)]
pub enum BookingServiceError {
    /// A user, tractor, or booking does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The acting user may not perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request is malformed or references unusable records.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested status edge is outside the transition table.
    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// The booking is terminal and its fields are frozen.
    #[error("booking is {status} and can no longer be edited")]
    Locked {
        /// Terminal status of the booking.
        status: BookingStatus,
    },

    /// The booking changed concurrently.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A dependency did not answer in time or could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Unexpected failure; details are logged, never returned to callers.
    #[error("internal error: {0}")]
    Internal(Arc<dyn std::error::Error + Send + Sync>),
}

/// Result type for booking service operations.
pub type BookingServiceResult<T> = Result<T, BookingServiceError>;

impl BookingServiceError {
    /// Returns the stable machine-readable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Locked { .. } => "booking_locked",
            Self::Conflict(_) => "conflict",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }
}

impl From<BookingDomainError> for BookingServiceError {
    fn from(err: BookingDomainError) -> Self {
        match err {
            BookingDomainError::InvalidStatusTransition { from, to, .. } => {
                Self::InvalidTransition { from, to }
            }
            BookingDomainError::BookingLocked { status, .. } => Self::Locked { status },
            BookingDomainError::EmptyServiceType
            | BookingDomainError::ServiceTypeTooLong { .. }
            | BookingDomainError::EmptyNote => Self::Validation(err.to_string()),
        }
    }
}

impl From<BookingRepositoryError> for BookingServiceError {
    fn from(err: BookingRepositoryError) -> Self {
        match err {
            BookingRepositoryError::NotFound(id) => Self::not_found("service booking", id),
            BookingRepositoryError::DuplicateBooking(_)
            | BookingRepositoryError::StatusConflict { .. }
            | BookingRepositoryError::StaleRevision(_) => Self::Conflict(err.to_string()),
            BookingRepositoryError::Persistence(cause) => Self::Internal(cause),
        }
    }
}

impl From<DirectoryError> for BookingServiceError {
    fn from(err: DirectoryError) -> Self {
        Self::Unavailable(err.to_string())
    }
}
