//! FarmPower service bookings: maintenance requests for farm equipment.
//!
//! A customer asks a service provider to maintain a tractor; the resulting
//! booking moves through a small state machine whose edges are gated by who
//! is asking and how they relate to the booking.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: booking aggregate, status table, and authorization guard
//! - **Ports**: repository, directory lookup, and notification contracts
//! - **Adapters**: in-memory and `PostgreSQL` persistence, notification queue
//! - **Services**: the booking orchestrator used by the HTTP surface
//!
//! # Modules
//!
//! - [`booking`]: service-booking lifecycle
//! - [`http`]: axum routes over the booking service
//! - [`config`]: layered application configuration
//! - [`telemetry`]: tracing subscriber setup

pub mod booking;
pub mod config;
pub mod http;
pub mod telemetry;
