//! Booking lifecycle orchestration.

use super::{
    BookingServiceError, BookingServiceResult, CancelOutcome, CreateBookingRequest,
    ListBookingsQuery, UpdateBookingRequest,
};
use crate::booking::{
    domain::{
        BookingId, BookingStatus, NewBooking, Relationship, ServiceBooking, ServiceType,
        TractorId, User, UserId, UserRole, access,
    },
    ports::{
        BookingFilter, BookingNotification, BookingRepository, BookingRepositoryResult,
        BookingRevision, NotificationOutbox, Page, TractorRegistry, UserDirectory,
    },
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tunables for [`BookingService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingServiceConfig {
    /// Upper bound on any single repository or directory call.
    pub repository_timeout: Duration,
    /// Page size used when a listing does not ask for one.
    pub default_page_size: usize,
    /// Largest page size a listing may ask for.
    pub max_page_size: usize,
}

impl Default for BookingServiceConfig {
    fn default() -> Self {
        Self {
            repository_timeout: Duration::from_secs(5),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Booking lifecycle orchestration service.
///
/// Every operation resolves the acting user, consults the authorization
/// guard, applies the domain change and persists it through a conditional
/// write. Status changes are then announced through the outbox.
#[derive(Clone)]
pub struct BookingService<R, D, O, C>
where
    R: BookingRepository,
    D: UserDirectory + TractorRegistry,
    O: NotificationOutbox,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    outbox: Arc<O>,
    clock: Arc<C>,
    config: BookingServiceConfig,
}

impl<R, D, O, C> BookingService<R, D, O, C>
where
    R: BookingRepository,
    D: UserDirectory + TractorRegistry,
    O: NotificationOutbox,
    C: Clock + Send + Sync,
{
    /// Creates a service with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, outbox: Arc<O>, clock: Arc<C>) -> Self {
        Self {
            repository,
            directory,
            outbox,
            clock,
            config: BookingServiceConfig::default(),
        }
    }

    /// Replaces the service tunables.
    #[must_use]
    pub const fn with_config(mut self, config: BookingServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the active tunables.
    #[must_use]
    pub const fn config(&self) -> &BookingServiceConfig {
        &self.config
    }

    /// Creates a pending booking on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::NotFound`] for an unknown actor,
    /// [`BookingServiceError::Forbidden`] for a deactivated one, and
    /// [`BookingServiceError::Validation`] for a blank service type, a
    /// missing date, an unknown tractor, or a provider who cannot fulfil
    /// bookings.
    pub async fn create(
        &self,
        actor_id: UserId,
        request: CreateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking> {
        let actor = self.resolve_actor(actor_id).await?;

        let CreateBookingRequest {
            service_type,
            scheduled_date,
            tractor_id,
            description,
            service_provider_id,
            notes,
        } = request;

        let service_type = ServiceType::new(service_type)?;
        let scheduled_date = scheduled_date
            .ok_or_else(|| BookingServiceError::validation("scheduled_date is required"))?;
        if let Some(id) = tractor_id {
            self.require_tractor(id).await?;
        }
        if let Some(id) = service_provider_id {
            self.require_provider(id).await?;
        }

        let booking = ServiceBooking::new(
            NewBooking {
                customer_id: actor.id,
                tractor_id,
                service_type,
                description,
                scheduled_date,
                service_provider_id,
                notes,
            },
            &*self.clock,
        );
        self.guarded("store booking", self.repository.store(&booking))
            .await?;

        info!(
            booking_id = %booking.id(),
            customer_id = %actor.id,
            service_type = booking.service_type().as_str(),
            "service booking created"
        );
        Ok(booking)
    }

    /// Returns a booking the actor may view.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::NotFound`] when the booking is absent
    /// and [`BookingServiceError::Forbidden`] when the actor has no
    /// relationship to it.
    pub async fn get(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<ServiceBooking> {
        let actor = self.resolve_actor(actor_id).await?;
        self.load_visible(&actor, id).await
    }

    /// Lists bookings from the actor's perspective.
    ///
    /// Administrators see every booking; providers asking for the provider
    /// view see bookings assigned to them; everyone else sees the bookings
    /// they requested.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError`] when the actor cannot be resolved or
    /// the repository fails.
    pub async fn list(
        &self,
        actor_id: UserId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>> {
        let actor = self.resolve_actor(actor_id).await?;
        let filter = if actor.is_admin() {
            BookingFilter::All
        } else if query.view_as_provider && actor.role == UserRole::ServiceProvider {
            BookingFilter::Provider(actor.id)
        } else {
            BookingFilter::Customer(actor.id)
        };
        let page = self.page(query);
        self.guarded("list bookings", self.repository.list(filter, page))
            .await
    }

    /// Lists the bookings that concern one tractor.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::NotFound`] for an unknown tractor and
    /// [`BookingServiceError::Forbidden`] unless the actor owns the tractor
    /// or is an administrator.
    pub async fn list_for_tractor(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
        query: ListBookingsQuery,
    ) -> BookingServiceResult<Vec<ServiceBooking>> {
        let actor = self.resolve_actor(actor_id).await?;
        let tractor = self
            .guarded("find tractor", self.directory.find_tractor(tractor_id))
            .await?
            .ok_or_else(|| BookingServiceError::not_found("tractor", tractor_id))?;
        if !actor.is_admin() && tractor.owner_id != actor.id {
            return Err(BookingServiceError::forbidden(
                "only the tractor owner may list its bookings",
            ));
        }
        let page = self.page(query);
        self.guarded(
            "list tractor bookings",
            self.repository.list(BookingFilter::Tractor(tractor_id), page),
        )
        .await
    }

    /// Edits the non-status fields of a booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::Forbidden`] when the actor may not
    /// edit the booking or attempts a provider-only change,
    /// [`BookingServiceError::Validation`] for an empty or invalid update,
    /// [`BookingServiceError::Locked`] for a terminal booking, and
    /// [`BookingServiceError::Conflict`] when the booking was written
    /// concurrently.
    pub async fn update_fields(
        &self,
        actor_id: UserId,
        id: BookingId,
        request: UpdateBookingRequest,
    ) -> BookingServiceResult<ServiceBooking> {
        let actor = self.resolve_actor(actor_id).await?;
        let mut booking = self.load_visible(&actor, id).await?;
        if !access::can_edit_fields(&actor, &booking) {
            return Err(BookingServiceError::forbidden(format!(
                "booking is {} and may no longer be edited by its customer",
                booking.status()
            )));
        }

        let patch = request.into_patch()?;
        if patch.is_empty() {
            return Err(BookingServiceError::validation("update contains no changes"));
        }
        if (patch.changes_provider() || patch.appends_note())
            && !access::can_manage_fulfilment(&actor, &booking)
        {
            return Err(BookingServiceError::forbidden(
                "only the assigned provider or an administrator may assign providers or append notes",
            ));
        }
        if let Some(tractor_id) = patch.tractor_id() {
            self.require_tractor(tractor_id).await?;
        }
        if let Some(provider_id) = patch.service_provider_id() {
            self.require_provider(provider_id).await?;
        }

        let observed = BookingRevision::of(&booking);
        booking.apply_patch(patch, &*self.clock)?;
        self.persist(
            booking.id(),
            self.repository.update(&booking, observed),
        )
        .await?;

        info!(booking_id = %id, actor_id = %actor.id, "service booking updated");
        Ok(booking)
    }

    /// Moves a booking to `target`.
    ///
    /// The counterpart of the acting user is notified afterwards; when an
    /// administrator acts, both customer and provider are notified.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::NotFound`] or
    /// [`BookingServiceError::Forbidden`] before any state-machine check,
    /// then [`BookingServiceError::InvalidTransition`] for an edge outside
    /// the table whatever the actor's role,
    /// [`BookingServiceError::Forbidden`] when the actor's role may not
    /// request a legal edge, and [`BookingServiceError::Conflict`] when the
    /// status changed concurrently.
    pub async fn transition(
        &self,
        actor_id: UserId,
        id: BookingId,
        target: BookingStatus,
    ) -> BookingServiceResult<ServiceBooking> {
        let actor = self.resolve_actor(actor_id).await?;
        let booking = self.load_visible(&actor, id).await?;
        self.transition_loaded(&actor, booking, target).await
    }

    /// Cancels a booking the way the actor is entitled to.
    ///
    /// Administrators delete the booking outright. Customers withdraw it,
    /// which keeps the record as [`BookingStatus::CancelledByUser`].
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::Forbidden`] for anyone but the
    /// customer or an administrator, and for a customer whose booking is
    /// past [`BookingStatus::Confirmed`], plus any error [`Self::transition`]
    /// or [`Self::delete`] can return.
    pub async fn cancel(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<CancelOutcome> {
        let actor = self.resolve_actor(actor_id).await?;
        if access::can_delete(&actor) {
            self.delete_as(&actor, id).await?;
            return Ok(CancelOutcome::Deleted);
        }

        let booking = self.load_visible(&actor, id).await?;
        if !access::is_customer(&actor, &booking) {
            return Err(BookingServiceError::forbidden(
                "only the customer may cancel this booking",
            ));
        }
        if !access::can_withdraw(&actor, &booking) {
            return Err(BookingServiceError::forbidden(format!(
                "booking is {} and not in a cancellable state",
                booking.status()
            )));
        }
        let cancelled = self
            .transition_loaded(&actor, booking, BookingStatus::CancelledByUser)
            .await?;
        Ok(CancelOutcome::Cancelled(cancelled))
    }

    /// Permanently removes a booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::Forbidden`] unless the actor is an
    /// administrator and [`BookingServiceError::NotFound`] when the booking
    /// is absent.
    pub async fn delete(&self, actor_id: UserId, id: BookingId) -> BookingServiceResult<()> {
        let actor = self.resolve_actor(actor_id).await?;
        if !access::can_delete(&actor) {
            return Err(BookingServiceError::forbidden(
                "only administrators may delete bookings",
            ));
        }
        self.delete_as(&actor, id).await
    }

    /// Removes every booking that references a deleted tractor.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError`] when the repository fails.
    pub async fn purge_tractor(&self, tractor_id: TractorId) -> BookingServiceResult<u64> {
        let removed = self
            .guarded(
                "purge tractor bookings",
                self.repository.delete_by_tractor(tractor_id),
            )
            .await?;
        info!(tractor_id = %tractor_id, removed, "tractor bookings purged");
        Ok(removed)
    }

    /// Removes every booking for a tractor on behalf of an administrator.
    ///
    /// # Errors
    ///
    /// Returns [`BookingServiceError::Forbidden`] unless the actor is an
    /// administrator.
    pub async fn purge_tractor_as(
        &self,
        actor_id: UserId,
        tractor_id: TractorId,
    ) -> BookingServiceResult<u64> {
        let actor = self.resolve_actor(actor_id).await?;
        if !access::can_delete(&actor) {
            return Err(BookingServiceError::forbidden(
                "only administrators may purge tractor bookings",
            ));
        }
        self.purge_tractor(tractor_id).await
    }

    async fn transition_loaded(
        &self,
        actor: &User,
        mut booking: ServiceBooking,
        target: BookingStatus,
    ) -> BookingServiceResult<ServiceBooking> {
        let previous = booking.status();
        if !previous.can_transition_to(target) {
            return Err(BookingServiceError::InvalidTransition {
                from: previous,
                to: target,
            });
        }
        if !access::role_permits_transition(actor, &booking, target) {
            return Err(BookingServiceError::forbidden(format!(
                "{} may not move this booking from {previous} to {target}",
                actor.role.as_str()
            )));
        }

        booking.apply_transition(target, &*self.clock)?;
        let booking = self
            .persist(
                booking.id(),
                self.repository
                    .update_status(booking.id(), previous, target, booking.updated_at()),
            )
            .await?;

        info!(
            booking_id = %booking.id(),
            actor_id = %actor.id,
            from = %previous,
            to = %target,
            "service booking status changed"
        );
        self.publish_status_change(actor, &booking, previous);
        Ok(booking)
    }

    async fn delete_as(&self, actor: &User, id: BookingId) -> BookingServiceResult<()> {
        self.guarded("delete booking", self.repository.delete(id))
            .await?;
        info!(booking_id = %id, actor_id = %actor.id, "service booking deleted");
        Ok(())
    }

    async fn persist<T, F>(&self, id: BookingId, write: F) -> BookingServiceResult<T>
    where
        F: Future<Output = BookingRepositoryResult<T>>,
    {
        let result = self.guarded("update booking", write).await;
        if let Err(BookingServiceError::Conflict(reason)) = &result {
            warn!(booking_id = %id, %reason, "concurrent booking change rejected");
        }
        result
    }

    fn publish_status_change(&self, actor: &User, booking: &ServiceBooking, previous: BookingStatus) {
        for recipient in notification_recipients(actor, booking) {
            let notification = BookingNotification::status_changed(recipient, booking, previous);
            if let Err(err) = self.outbox.publish(notification) {
                warn!(
                    booking_id = %booking.id(),
                    recipient = %recipient,
                    error = %err,
                    "failed to queue booking notification"
                );
            }
        }
    }

    async fn resolve_actor(&self, actor_id: UserId) -> BookingServiceResult<User> {
        let actor = self
            .guarded("find user", self.directory.find_user(actor_id))
            .await?
            .ok_or_else(|| BookingServiceError::not_found("user", actor_id))?;
        if !actor.is_active {
            return Err(BookingServiceError::forbidden("user account is inactive"));
        }
        Ok(actor)
    }

    async fn load_visible(&self, actor: &User, id: BookingId) -> BookingServiceResult<ServiceBooking> {
        let booking = self
            .guarded("find booking", self.repository.find_by_id(id))
            .await?
            .ok_or_else(|| BookingServiceError::not_found("service booking", id))?;
        if !access::can_view(actor, &booking) {
            return Err(BookingServiceError::forbidden(
                "not allowed to access this booking",
            ));
        }
        Ok(booking)
    }

    async fn require_tractor(&self, id: TractorId) -> BookingServiceResult<()> {
        let tractor = self
            .guarded("find tractor", self.directory.find_tractor(id))
            .await?;
        if tractor.is_none() {
            return Err(BookingServiceError::validation(format!(
                "tractor {id} does not exist"
            )));
        }
        Ok(())
    }

    async fn require_provider(&self, id: UserId) -> BookingServiceResult<()> {
        let provider = self
            .guarded("find provider", self.directory.find_user(id))
            .await?;
        match provider {
            Some(user) if user.role.can_fulfil_bookings() => Ok(()),
            Some(_) => Err(BookingServiceError::validation(format!(
                "user {id} cannot be assigned as a service provider"
            ))),
            None => Err(BookingServiceError::validation(format!(
                "service provider {id} does not exist"
            ))),
        }
    }

    fn page(&self, query: ListBookingsQuery) -> Page {
        let max = self.config.max_page_size.max(1);
        let limit = query
            .limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, max);
        Page::new(query.skip, limit)
    }

    async fn guarded<T, E, F>(&self, operation: &'static str, call: F) -> BookingServiceResult<T>
    where
        F: Future<Output = Result<T, E>>,
        BookingServiceError: From<E>,
    {
        match tokio::time::timeout(self.config.repository_timeout, call).await {
            Ok(result) => result.map_err(BookingServiceError::from),
            Err(_) => {
                warn!(
                    operation,
                    timeout = ?self.config.repository_timeout,
                    "storage call timed out"
                );
                Err(BookingServiceError::Unavailable(format!(
                    "{operation} timed out"
                )))
            }
        }
    }
}

/// Picks who hears about a status change made by `actor`.
///
/// The actor is never notified about their own change.
fn notification_recipients(actor: &User, booking: &ServiceBooking) -> Vec<UserId> {
    let customer = Some(booking.customer_id());
    let provider = booking.service_provider_id();
    let candidates = match Relationship::of(actor, booking) {
        Relationship::Admin => [customer, provider],
        Relationship::AssignedProvider => [customer, None],
        Relationship::Customer => [provider, None],
        Relationship::Stranger => [None, None],
    };

    let mut recipients = Vec::with_capacity(2);
    for recipient in candidates.into_iter().flatten() {
        if recipient != actor.id && !recipients.contains(&recipient) {
            recipients.push(recipient);
        }
    }
    recipients
}
