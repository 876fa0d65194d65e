//! `PostgreSQL` adapters for booking persistence.

mod bootstrap;
mod models;
mod repository;
mod schema;

pub use bootstrap::{apply_migrations, mirror_tractors};
pub use repository::{BookingPgPool, PostgresBookingRepository};
