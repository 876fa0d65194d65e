//! Port contracts for the booking lifecycle.
//!
//! Ports define infrastructure-agnostic interfaces used by booking services.

pub mod directory;
pub mod notification;
pub mod repository;

pub use directory::{DirectoryError, DirectoryResult, TractorRegistry, UserDirectory};
pub use notification::{
    BookingNotification, NotificationDispatcher, NotificationError, NotificationKind,
    NotificationOutbox, SERVICE_BOOKING_ENTITY,
};
pub use repository::{
    BookingFilter, BookingRepository, BookingRepositoryError, BookingRepositoryResult,
    BookingRevision, Page,
};
