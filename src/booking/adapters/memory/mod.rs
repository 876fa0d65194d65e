//! In-memory adapters for tests and database-less deployments.

mod booking;
mod directory;
mod outbox;

pub use booking::InMemoryBookingRepository;
pub use directory::InMemoryDirectory;
pub use outbox::RecordingOutbox;
