//! Domain model for the service-booking lifecycle.
//!
//! The booking domain models creation, field edits, status transitions, and
//! the authorization rules that decide which actor may do what, while keeping
//! all infrastructure concerns outside of the domain boundary.

pub mod access;
mod actor;
mod booking;
mod error;
mod ids;
mod status;

pub use access::Relationship;
pub use actor::{Tractor, User, UserRole};
pub use booking::{BookingPatch, NewBooking, PersistedBookingData, ServiceBooking, ServiceType};
pub use error::{BookingDomainError, ParseBookingStatusError, ParseUserRoleError};
pub use ids::{BookingId, TractorId, UserId};
pub use status::BookingStatus;
