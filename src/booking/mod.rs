//! Service-booking lifecycle management.
//!
//! A booking links a customer, an optional tractor, and an optional assigned
//! service provider. Status changes are validated against a single transition
//! table and gated by the acting user's relationship to the booking. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
