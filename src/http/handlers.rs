//! Request handlers for the booking endpoints.

use axum::{
    Extension, Json,
    extract::{
        Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    ActingUser, ApiError,
    dto::{
        CreateBookingBody, HealthResponse, ListParams, PurgeResponse, StatusChangeBody,
        UpdateBookingBody,
    },
};
use crate::booking::{
    domain::{BookingId, ServiceBooking, TractorId},
    services::BookingOperations,
};

type Service = Extension<Arc<dyn BookingOperations>>;

fn bad_request(message: String) -> ApiError {
    ApiError::BadRequest(message)
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
    })
}

pub(super) async fn create_booking(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    body: Result<Json<CreateBookingBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceBooking>), ApiError> {
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let booking = service.create(actor_id, body.into_request()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub(super) async fn list_bookings(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ServiceBooking>>, ApiError> {
    let Query(params) = params.map_err(|rejection| bad_request(rejection.body_text()))?;
    let bookings = service.list(actor_id, params.into()).await?;
    Ok(Json(bookings))
}

pub(super) async fn get_booking(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<Json<ServiceBooking>, ApiError> {
    let Path(id) = id.map_err(|rejection| bad_request(rejection.body_text()))?;
    Ok(Json(service.get(actor_id, id).await?))
}

pub(super) async fn update_booking(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    id: Result<Path<BookingId>, PathRejection>,
    body: Result<Json<UpdateBookingBody>, JsonRejection>,
) -> Result<Json<ServiceBooking>, ApiError> {
    let Path(id) = id.map_err(|rejection| bad_request(rejection.body_text()))?;
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let booking = service
        .update_fields(actor_id, id, body.into_request())
        .await?;
    Ok(Json(booking))
}

pub(super) async fn change_status(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    id: Result<Path<BookingId>, PathRejection>,
    body: Result<Json<StatusChangeBody>, JsonRejection>,
) -> Result<Json<ServiceBooking>, ApiError> {
    let Path(id) = id.map_err(|rejection| bad_request(rejection.body_text()))?;
    let Json(body) = body.map_err(|rejection| bad_request(rejection.body_text()))?;
    let target = body.target()?;
    Ok(Json(service.transition(actor_id, id, target).await?))
}

pub(super) async fn cancel_booking(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    id: Result<Path<BookingId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|rejection| bad_request(rejection.body_text()))?;
    service.cancel(actor_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_tractor_bookings(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    tractor_id: Result<Path<TractorId>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<ServiceBooking>>, ApiError> {
    let Path(tractor_id) = tractor_id.map_err(|rejection| bad_request(rejection.body_text()))?;
    let Query(params) = params.map_err(|rejection| bad_request(rejection.body_text()))?;
    let bookings = service
        .list_for_tractor(actor_id, tractor_id, params.into())
        .await?;
    Ok(Json(bookings))
}

pub(super) async fn purge_tractor_bookings(
    Extension(service): Service,
    ActingUser(actor_id): ActingUser,
    tractor_id: Result<Path<TractorId>, PathRejection>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let Path(tractor_id) = tractor_id.map_err(|rejection| bad_request(rejection.body_text()))?;
    let removed = service.purge_tractor(actor_id, tractor_id).await?;
    Ok(Json(PurgeResponse { removed }))
}
