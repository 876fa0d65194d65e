//! HTTP surface for service bookings.
//!
//! The router only translates between JSON and the booking service; every
//! authorization decision is made by [`BookingOperations`].

mod dto;
mod error;
mod handlers;
mod identity;

use axum::{
    Extension, Router,
    routing::{get, patch, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::booking::services::BookingOperations;

pub use dto::{
    CreateBookingBody, HealthResponse, ListParams, PurgeResponse, StatusChangeBody,
    UpdateBookingBody,
};
pub use error::{ApiError, ErrorBody};
pub use identity::{ActingUser, USER_ID_HEADER};

/// Builds the application router around a booking service.
pub fn router(service: Arc<dyn BookingOperations>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/service-bookings",
            post(handlers::create_booking).get(handlers::list_bookings),
        )
        .route(
            "/service-bookings/:id",
            get(handlers::get_booking)
                .put(handlers::update_booking)
                .delete(handlers::cancel_booking),
        )
        .route(
            "/service-bookings/:id/status",
            patch(handlers::change_status),
        )
        .route(
            "/tractors/:id/service-bookings",
            get(handlers::list_tractor_bookings).delete(handlers::purge_tractor_bookings),
        )
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http())
}
