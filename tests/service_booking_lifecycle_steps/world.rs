//! Shared world state for service booking lifecycle scenarios.

use std::sync::Arc;

use farmpower_bookings::booking::{
    adapters::memory::{InMemoryBookingRepository, InMemoryDirectory, RecordingOutbox},
    domain::{ServiceBooking, Tractor, User},
    services::{BookingService, BookingServiceError},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestBookingService =
    BookingService<InMemoryBookingRepository, InMemoryDirectory, RecordingOutbox, DefaultClock>;

/// Scenario world for booking lifecycle behaviour tests.
pub struct BookingWorld {
    pub service: TestBookingService,
    pub directory: Arc<InMemoryDirectory>,
    pub outbox: Arc<RecordingOutbox>,
    pub farmer: Option<User>,
    pub tractor: Option<Tractor>,
    pub provider: Option<User>,
    pub other_provider: Option<User>,
    pub admin: Option<User>,
    pub booking: Option<ServiceBooking>,
    pub last_error: Option<BookingServiceError>,
}

impl BookingWorld {
    /// Creates a world backed by empty in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryDirectory::new());
        let outbox = Arc::new(RecordingOutbox::new());
        let service = BookingService::new(
            Arc::new(InMemoryBookingRepository::new()),
            Arc::clone(&directory),
            Arc::clone(&outbox),
            Arc::new(DefaultClock),
        );

        Self {
            service,
            directory,
            outbox,
            farmer: None,
            tractor: None,
            provider: None,
            other_provider: None,
            admin: None,
            booking: None,
            last_error: None,
        }
    }

    /// Returns the booking created by the scenario.
    pub fn booking(&self) -> Result<&ServiceBooking, eyre::Report> {
        self.booking
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing booking in scenario world"))
    }

    /// Records the outcome of an operation that may replace the booking.
    pub fn record(&mut self, result: Result<ServiceBooking, BookingServiceError>) {
        match result {
            Ok(booking) => {
                self.booking = Some(booking);
                self.last_error = None;
            }
            Err(err) => self.last_error = Some(err),
        }
    }
}

impl Default for BookingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BookingWorld {
    BookingWorld::default()
}

/// Looks up a named participant of the scenario.
pub fn participant(slot: Option<User>, name: &str) -> Result<User, eyre::Report> {
    slot.ok_or_else(|| eyre::eyre!("missing {name} in scenario world"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
