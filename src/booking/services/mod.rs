//! Application services for booking lifecycle orchestration.

mod error;
mod lifecycle;
mod operations;
mod requests;

pub use error::{BookingServiceError, BookingServiceResult};
pub use lifecycle::{BookingService, BookingServiceConfig};
pub use operations::BookingOperations;
pub use requests::{
    CancelOutcome, CreateBookingRequest, ListBookingsQuery, UpdateBookingRequest,
};
