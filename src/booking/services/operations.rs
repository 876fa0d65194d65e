//! Object-safe facade over the booking service for the HTTP layer.

use super::{
    BookingService, BookingServiceResult, CancelOutcome, CreateBookingRequest, ListBookingsQuery,
    UpdateBookingRequest,
};
use crate::booking::{
    domain::{BookingId, BookingStatus, ServiceBooking, TractorId, UserId},
    ports::{BookingRepository, NotificationOutbox, TractorRegistry, UserDirectory},
};
use async_trait::async_trait;
use mockable::Clock;

/// Booking operations reachable from transport adapters.
///
/// The HTTP router holds an `Arc<dyn BookingOperations>` so that it does not
/// depend on the concrete adapters the service was built with.
#[async_trait]
pub trait BookingOperations: Send + Sync {
    /// See [`BookingService::create`].
    async fn create(
        &self,
        actor_id: UserId,
        request: CreateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking>;

    /// See [`BookingService::get`].
    async fn get(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<ServiceBooking>;

    /// See [`BookingService::list`].
    async fn list(
        &self,
        actor_id: UserId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>>;

    /// See [`BookingService::list_for_tractor`].
    async fn list_for_tractor(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>>;

    /// See [`BookingService::update_fields`].
    async fn update_fields(
        &self,
        actor_id: UserId,
        id: BookingId,
        request: UpdateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking>;

    /// See [`BookingService::transition`].
    async fn transition(
        &self,
        actor_id: UserId,
        id: BookingId,
        target: BookingStatus,
    ) -> BookingServiceResult<ServiceBooking>;

    /// See [`BookingService::cancel`].
    async fn cancel(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<CancelOutcome>;

    /// See [`BookingService::delete`].
    async fn delete(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<()>;

    /// See [`BookingService::purge_tractor_as`].
    async fn purge_tractor(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
    ) -> BookingServiceResult<u64>;
}

#[async_trait]
impl<R, D, O, C> BookingOperations for BookingService<R, D, O, C>
where
    R: BookingRepository + 'static,
    D: UserDirectory + TractorRegistry + 'static,
    O: NotificationOutbox + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn create(
        &self,
        actor_id: UserId,
        request: CreateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking> {
        Self::create(self, actor_id, request).await
    }

    async fn get(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<ServiceBooking> {
        Self::get(self, actor_id, id).await
    }

    async fn list(
        &self,
        actor_id: UserId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>> {
        Self::list(self, actor_id, query).await
    }

    async fn list_for_tractor(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>> {
        Self::list_for_tractor(self, actor_id, tractor_id, query).await
    }

    async fn update_fields(
        &self,
        actor_id: UserId,
        id: BookingId,
        request: UpdateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking> {
        Self::update_fields(self, actor_id, id, request).await
    }

    async fn transition(
        &self,
        actor_id: UserId,
        id: BookingId,
        target: BookingStatus,
    ) -> BookingServiceResult<ServiceBooking> {
        Self::transition(self, actor_id, id, target).await
    }

    async fn cancel(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<CancelOutcome> {
        Self::cancel(self, actor_id, id).await
    }

    async fn delete(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<()> {
        Self::delete(self, actor_id, id).await
    }

    async fn purge_tractor(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
    ) -> BookingServiceResult<u64> {
        self.purge_tractor_as(actor_id, tractor_id).await
    }
}
