//! Adapter implementations of the booking ports.

pub mod memory;
pub mod outbox;
pub mod postgres;
