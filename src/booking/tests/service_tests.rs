//! Service orchestration tests for the booking lifecycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tokio::sync::{Barrier, Notify};

use crate::booking::{
    adapters::memory::{InMemoryBookingRepository, InMemoryDirectory, RecordingOutbox},
    domain::{
        BookingId, BookingPatch, BookingStatus, NewBooking, ServiceBooking, ServiceType, Tractor,
        TractorId, User, UserId, UserRole,
    },
    ports::{
        BookingFilter, BookingRepository, BookingRepositoryResult, BookingRevision,
        NotificationError, NotificationKind, Page, SERVICE_BOOKING_ENTITY,
    },
    services::{
        BookingService, BookingServiceConfig, BookingServiceError, CancelOutcome,
        CreateBookingRequest, ListBookingsQuery, UpdateBookingRequest,
    },
};

type TestService =
    BookingService<InMemoryBookingRepository, InMemoryDirectory, RecordingOutbox, DefaultClock>;

struct Harness {
    service: TestService,
    repository: Arc<InMemoryBookingRepository>,
    directory: Arc<InMemoryDirectory>,
    outbox: Arc<RecordingOutbox>,
    farmer: User,
    dealer: User,
    provider: User,
    other_provider: User,
    admin: User,
    tractor: Tractor,
}

fn seeded_directory() -> (Arc<InMemoryDirectory>, [User; 5], Tractor) {
    let directory = Arc::new(InMemoryDirectory::new());
    let farmer = User::new(UserId::new(), UserRole::Farmer);
    let dealer = User::new(UserId::new(), UserRole::Dealer);
    let provider = User::new(UserId::new(), UserRole::ServiceProvider);
    let other_provider = User::new(UserId::new(), UserRole::ServiceProvider);
    let admin = User::new(UserId::new(), UserRole::Admin);
    for user in [farmer, dealer, provider, other_provider, admin] {
        directory.insert_user(user);
    }
    let tractor = Tractor {
        id: TractorId::new(),
        owner_id: farmer.id,
    };
    directory.insert_tractor(tractor);
    (
        directory,
        [farmer, dealer, provider, other_provider, admin],
        tractor,
    )
}

fn harness_with(outbox: RecordingOutbox, config: BookingServiceConfig) -> Harness {
    let repository = Arc::new(InMemoryBookingRepository::new());
    let outbox = Arc::new(outbox);
    let (directory, [farmer, dealer, provider, other_provider, admin], tractor) =
        seeded_directory();
    let service = BookingService::new(
        Arc::clone(&repository),
        Arc::clone(&directory),
        Arc::clone(&outbox),
        Arc::new(DefaultClock),
    )
    .with_config(config);
    Harness {
        service,
        repository,
        directory,
        outbox,
        farmer,
        dealer,
        provider,
        other_provider,
        admin,
        tractor,
    }
}

#[fixture]
fn harness() -> Harness {
    harness_with(RecordingOutbox::new(), BookingServiceConfig::default())
}

fn in_days(days: i64) -> DateTime<Utc> {
    Utc::now() + TimeDelta::days(days)
}

impl Harness {
    fn request(&self) -> CreateBookingRequest {
        CreateBookingRequest::new("600-hour maintenance")
            .scheduled_for(in_days(7))
            .with_tractor(self.tractor.id)
            .with_description("Engine knocks under load")
            .with_service_provider(self.provider.id)
    }

    async fn booking(&self) -> ServiceBooking {
        self.service
            .create(self.farmer.id, self.request())
            .await
            .expect("booking creation should succeed")
    }

    async fn booking_in(&self, status: BookingStatus) -> ServiceBooking {
        let booking = self.booking().await;
        let path: &[BookingStatus] = match status {
            BookingStatus::Pending => &[],
            BookingStatus::Confirmed => &[BookingStatus::Confirmed],
            BookingStatus::InProgress => &[BookingStatus::Confirmed, BookingStatus::InProgress],
            BookingStatus::Completed => &[
                BookingStatus::Confirmed,
                BookingStatus::InProgress,
                BookingStatus::Completed,
            ],
            BookingStatus::CancelledByUser => &[BookingStatus::CancelledByUser],
            BookingStatus::CancelledByProvider => &[BookingStatus::CancelledByProvider],
        };
        let mut current = booking;
        for step in path {
            current = self
                .service
                .transition(self.admin.id, current.id(), *step)
                .await
                .expect("admin may take any legal edge");
        }
        current
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_then_get_round_trips_submitted_fields(harness: Harness) {
    let scheduled = in_days(3);
    let request = CreateBookingRequest::new("Hydraulic leak")
        .scheduled_for(scheduled)
        .with_tractor(harness.tractor.id)
        .with_description("Drips near the rear lift")
        .with_service_provider(harness.provider.id)
        .with_notes("Call before arriving");

    let created = harness
        .service
        .create(harness.farmer.id, request)
        .await
        .expect("booking creation should succeed");
    let fetched = harness
        .service
        .get(harness.farmer.id, created.id())
        .await
        .expect("customer may view own booking");

    assert_eq!(fetched, created);
    assert_eq!(fetched.status(), BookingStatus::Pending);
    assert_eq!(fetched.customer_id(), harness.farmer.id);
    assert_eq!(fetched.service_type().as_str(), "Hydraulic leak");
    assert_eq!(fetched.description(), Some("Drips near the rear lift"));
    assert_eq!(fetched.scheduled_date(), scheduled);
    assert_eq!(fetched.tractor_id(), Some(harness.tractor.id));
    assert_eq!(fetched.service_provider_id(), Some(harness.provider.id));
    assert_eq!(fetched.notes(), Some("Call before arriving"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_validates_required_fields(harness: Harness) {
    let blank = harness
        .service
        .create(
            harness.farmer.id,
            CreateBookingRequest::new("  ").scheduled_for(in_days(1)),
        )
        .await;
    let undated = harness
        .service
        .create(harness.farmer.id, CreateBookingRequest::new("Oil change"))
        .await;

    assert!(matches!(blank, Err(BookingServiceError::Validation(_))));
    assert!(matches!(undated, Err(BookingServiceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_unknown_tractor(harness: Harness) {
    let request = CreateBookingRequest::new("Oil change")
        .scheduled_for(in_days(1))
        .with_tractor(TractorId::new());

    let result = harness.service.create(harness.farmer.id, request).await;

    assert!(matches!(result, Err(BookingServiceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_provider_who_cannot_fulfil(harness: Harness) {
    let request = CreateBookingRequest::new("Oil change")
        .scheduled_for(in_days(1))
        .with_service_provider(harness.dealer.id);

    let result = harness.service.create(harness.farmer.id, request).await;

    assert!(matches!(result, Err(BookingServiceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_and_inactive_actors_are_rejected(harness: Harness) {
    let inactive = User::new(UserId::new(), UserRole::Farmer).deactivated();
    harness.directory.insert_user(inactive);

    let unknown = harness
        .service
        .create(UserId::new(), harness.request())
        .await;
    let deactivated = harness.service.create(inactive.id, harness.request()).await;

    assert!(matches!(
        unknown,
        Err(BookingServiceError::NotFound { entity: "user", .. })
    ));
    assert!(matches!(deactivated, Err(BookingServiceError::Forbidden(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_hides_bookings_from_strangers(harness: Harness) {
    let booking = harness.booking().await;

    let stranger = harness
        .service
        .get(harness.other_provider.id, booking.id())
        .await;
    let missing = harness
        .service
        .get(harness.other_provider.id, BookingId::new())
        .await;

    assert!(matches!(stranger, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(
        missing,
        Err(BookingServiceError::NotFound {
            entity: "service booking",
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_follows_the_actor_perspective(harness: Harness) {
    let farmer_booking = harness.booking().await;
    let dealer_booking = harness
        .service
        .create(
            harness.dealer.id,
            CreateBookingRequest::new("Tyre swap").scheduled_for(in_days(2)),
        )
        .await
        .expect("booking creation should succeed");

    let everything = harness
        .service
        .list(harness.admin.id, ListBookingsQuery::new())
        .await
        .expect("admin listing");
    let assigned = harness
        .service
        .list(harness.provider.id, ListBookingsQuery::new().as_provider())
        .await
        .expect("provider listing");
    let own_as_customer = harness
        .service
        .list(harness.provider.id, ListBookingsQuery::new())
        .await
        .expect("provider customer listing");
    let farmer_view = harness
        .service
        .list(harness.farmer.id, ListBookingsQuery::new().as_provider())
        .await
        .expect("farmer listing");

    assert_eq!(everything, vec![farmer_booking.clone(), dealer_booking]);
    assert_eq!(assigned, vec![farmer_booking.clone()]);
    assert!(own_as_customer.is_empty());
    assert_eq!(farmer_view, vec![farmer_booking]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_orders_newest_first_and_clamps_page_size() {
    let config = BookingServiceConfig {
        max_page_size: 2,
        default_page_size: 2,
        ..BookingServiceConfig::default()
    };
    let harness = harness_with(RecordingOutbox::new(), config);
    for days in [1, 3, 2] {
        harness
            .service
            .create(
                harness.farmer.id,
                CreateBookingRequest::new("Inspection").scheduled_for(in_days(days)),
            )
            .await
            .expect("booking creation should succeed");
    }

    let capped = harness
        .service
        .list(harness.farmer.id, ListBookingsQuery::new().with_limit(50))
        .await
        .expect("listing");
    let at_least_one = harness
        .service
        .list(harness.farmer.id, ListBookingsQuery::new().with_limit(0))
        .await
        .expect("listing");
    let second_page = harness
        .service
        .list(harness.farmer.id, ListBookingsQuery::new().with_skip(2))
        .await
        .expect("listing");

    assert_eq!(capped.len(), 2);
    assert!(
        capped
            .windows(2)
            .all(|pair| matches!(pair, [newer, older] if newer.scheduled_date() >= older.scheduled_date()))
    );
    assert_eq!(at_least_one.len(), 1);
    assert_eq!(second_page.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tractor_listing_is_limited_to_owner_and_admin(harness: Harness) {
    let booking = harness.booking().await;

    let owner = harness
        .service
        .list_for_tractor(harness.farmer.id, harness.tractor.id, ListBookingsQuery::new())
        .await
        .expect("owner may list");
    let admin = harness
        .service
        .list_for_tractor(harness.admin.id, harness.tractor.id, ListBookingsQuery::new())
        .await
        .expect("admin may list");
    let dealer = harness
        .service
        .list_for_tractor(harness.dealer.id, harness.tractor.id, ListBookingsQuery::new())
        .await;
    let unknown = harness
        .service
        .list_for_tractor(harness.admin.id, TractorId::new(), ListBookingsQuery::new())
        .await;

    assert_eq!(owner, vec![booking.clone()]);
    assert_eq!(admin, vec![booking]);
    assert!(matches!(dealer, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(
        unknown,
        Err(BookingServiceError::NotFound {
            entity: "tractor",
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_scenario_locks_customer_edits_and_terminal_states(harness: Harness) {
    let booking = harness.booking().await;
    assert_eq!(booking.status(), BookingStatus::Pending);

    let confirmed = harness
        .service
        .transition(harness.provider.id, booking.id(), BookingStatus::Confirmed)
        .await
        .expect("provider confirms");
    assert_eq!(confirmed.status(), BookingStatus::Confirmed);

    let customer_edit = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new().with_description("Actually it squeaks"),
        )
        .await;
    assert!(matches!(customer_edit, Err(BookingServiceError::Forbidden(_))));

    for target in [BookingStatus::InProgress, BookingStatus::Completed] {
        let moved = harness
            .service
            .transition(harness.provider.id, booking.id(), target)
            .await
            .expect("provider advances the booking");
        assert_eq!(moved.status(), target);
    }

    let late_cancel = harness
        .service
        .transition(
            harness.provider.id,
            booking.id(),
            BookingStatus::CancelledByProvider,
        )
        .await;
    assert!(matches!(
        late_cancel,
        Err(BookingServiceError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::CancelledByProvider,
        })
    ));
}

#[rstest]
#[case(BookingStatus::Pending, BookingStatus::Confirmed)]
#[case(BookingStatus::Confirmed, BookingStatus::InProgress)]
#[case(BookingStatus::InProgress, BookingStatus::Completed)]
#[tokio::test(flavor = "multi_thread")]
async fn customer_cannot_take_provider_edges(
    harness: Harness,
    #[case] from: BookingStatus,
    #[case] to: BookingStatus,
) {
    let booking = harness.booking_in(from).await;

    let result = harness
        .service
        .transition(harness.farmer.id, booking.id(), to)
        .await;

    assert!(matches!(result, Err(BookingServiceError::Forbidden(_))));
}

#[rstest]
#[case(BookingStatus::Pending, BookingStatus::Completed)]
#[case(BookingStatus::InProgress, BookingStatus::CancelledByUser)]
#[case(BookingStatus::Completed, BookingStatus::Confirmed)]
#[case(BookingStatus::CancelledByProvider, BookingStatus::Pending)]
#[tokio::test(flavor = "multi_thread")]
async fn edges_outside_the_table_are_invalid_for_every_related_actor(
    harness: Harness,
    #[case] from: BookingStatus,
    #[case] to: BookingStatus,
) {
    let booking = harness.booking_in(from).await;

    for actor in [harness.farmer.id, harness.provider.id, harness.admin.id] {
        let result = harness.service.transition(actor, booking.id(), to).await;
        assert!(
            matches!(result, Err(BookingServiceError::InvalidTransition { .. })),
            "unexpected {result:?}"
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_learn_nothing_about_transition_validity(harness: Harness) {
    let booking = harness.booking_in(BookingStatus::Completed).await;

    let result = harness
        .service
        .transition(
            harness.other_provider.id,
            booking.id(),
            BookingStatus::Confirmed,
        )
        .await;

    assert!(matches!(result, Err(BookingServiceError::Forbidden(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_confirmation_notifies_customer(harness: Harness) {
    let booking = harness.booking().await;

    harness
        .service
        .transition(harness.provider.id, booking.id(), BookingStatus::Confirmed)
        .await
        .expect("provider confirms");

    let published = harness.outbox.published();
    assert_eq!(published.len(), 1);
    let notice = published.first().expect("one notification");
    assert_eq!(notice.recipient, harness.farmer.id);
    assert_eq!(notice.kind, NotificationKind::ServiceStatusUpdate);
    assert_eq!(notice.related_entity_type, SERVICE_BOOKING_ENTITY);
    assert_eq!(notice.related_entity_id, booking.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admin_transition_notifies_both_parties(harness: Harness) {
    let booking = harness.booking().await;

    harness
        .service
        .transition(harness.admin.id, booking.id(), BookingStatus::Confirmed)
        .await
        .expect("admin confirms");

    let recipients: Vec<UserId> = harness
        .outbox
        .published()
        .into_iter()
        .map(|notice| notice.recipient)
        .collect();
    assert_eq!(recipients, vec![harness.farmer.id, harness.provider.id]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_notification_does_not_roll_back() {
    let harness = harness_with(
        RecordingOutbox::rejecting(NotificationError::QueueFull),
        BookingServiceConfig::default(),
    );
    let booking = harness.booking().await;

    let confirmed = harness
        .service
        .transition(harness.provider.id, booking.id(), BookingStatus::Confirmed)
        .await
        .expect("transition succeeds despite a full queue");
    let stored = harness
        .service
        .get(harness.farmer.id, booking.id())
        .await
        .expect("booking still readable");

    assert_eq!(confirmed.status(), BookingStatus::Confirmed);
    assert_eq!(stored.status(), BookingStatus::Confirmed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn customer_may_edit_pending_booking_fields(harness: Harness) {
    let booking = harness.booking().await;
    let rescheduled = in_days(14);

    let updated = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new()
                .with_description("Also check the PTO")
                .with_scheduled_date(rescheduled),
        )
        .await
        .expect("customer edits pending booking");

    assert_eq!(updated.description(), Some("Also check the PTO"));
    assert_eq!(updated.scheduled_date(), rescheduled);
    assert_eq!(updated.status(), BookingStatus::Pending);
    assert!(updated.updated_at() >= booking.updated_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn customer_cannot_reassign_provider_or_append_notes(harness: Harness) {
    let booking = harness.booking().await;

    let reassign = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new().with_service_provider(harness.other_provider.id),
        )
        .await;
    let append = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new().with_appended_note("please hurry"),
        )
        .await;

    assert!(matches!(reassign, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(append, Err(BookingServiceError::Forbidden(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_appends_notes_until_terminal(harness: Harness) {
    let booking = harness.booking_in(BookingStatus::InProgress).await;

    let noted = harness
        .service
        .update_fields(
            harness.provider.id,
            booking.id(),
            UpdateBookingRequest::new().with_appended_note("Replaced injector"),
        )
        .await
        .expect("provider appends a note");
    assert_eq!(noted.notes(), Some("Replaced injector"));

    harness
        .service
        .transition(harness.provider.id, booking.id(), BookingStatus::Completed)
        .await
        .expect("provider completes");
    let locked = harness
        .service
        .update_fields(
            harness.provider.id,
            booking.id(),
            UpdateBookingRequest::new().with_appended_note("Invoice sent"),
        )
        .await;

    assert!(matches!(
        locked,
        Err(BookingServiceError::Locked {
            status: BookingStatus::Completed
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_assignment_requires_fulfilling_role(harness: Harness) {
    let booking = harness.booking().await;

    let reassigned = harness
        .service
        .update_fields(
            harness.admin.id,
            booking.id(),
            UpdateBookingRequest::new().with_service_provider(harness.other_provider.id),
        )
        .await
        .expect("admin reassigns");
    let to_farmer = harness
        .service
        .update_fields(
            harness.admin.id,
            booking.id(),
            UpdateBookingRequest::new().with_service_provider(harness.dealer.id),
        )
        .await;

    assert_eq!(
        reassigned.service_provider_id(),
        Some(harness.other_provider.id)
    );
    assert!(matches!(to_farmer, Err(BookingServiceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn nullable_fields_can_be_cleared(harness: Harness) {
    let booking = harness.booking().await;

    let unassign_as_customer = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new().without_service_provider(),
        )
        .await;
    let detached = harness
        .service
        .update_fields(
            harness.farmer.id,
            booking.id(),
            UpdateBookingRequest::new()
                .without_tractor()
                .without_description(),
        )
        .await
        .expect("customer clears tractor and description");
    let unassigned = harness
        .service
        .update_fields(
            harness.admin.id,
            booking.id(),
            UpdateBookingRequest::new().without_service_provider(),
        )
        .await
        .expect("admin unassigns the provider");

    assert!(matches!(
        unassign_as_customer,
        Err(BookingServiceError::Forbidden(_))
    ));
    assert_eq!(detached.tractor_id(), None);
    assert_eq!(detached.description(), None);
    assert_eq!(detached.service_provider_id(), Some(harness.provider.id));
    assert_eq!(unassigned.service_provider_id(), None);
    assert_eq!(unassigned.service_type(), booking.service_type());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_update_is_rejected(harness: Harness) {
    let booking = harness.booking().await;

    let result = harness
        .service
        .update_fields(harness.farmer.id, booking.id(), UpdateBookingRequest::new())
        .await;

    assert!(matches!(result, Err(BookingServiceError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admin_hard_delete_differs_from_customer_cancel(harness: Harness) {
    let completed = harness.booking_in(BookingStatus::Completed).await;
    let pending = harness.booking().await;

    let deleted = harness
        .service
        .cancel(harness.admin.id, completed.id())
        .await
        .expect("admin deletes");
    let cancelled = harness
        .service
        .cancel(harness.farmer.id, pending.id())
        .await
        .expect("customer cancels");

    assert_eq!(deleted, CancelOutcome::Deleted);
    assert!(matches!(
        harness.service.get(harness.admin.id, completed.id()).await,
        Err(BookingServiceError::NotFound { .. })
    ));
    let CancelOutcome::Cancelled(kept) = cancelled else {
        panic!("customer cancel must keep the booking");
    };
    assert_eq!(kept.status(), BookingStatus::CancelledByUser);
    let fetched = harness
        .service
        .get(harness.farmer.id, pending.id())
        .await
        .expect("cancelled booking is retained");
    assert_eq!(fetched.status(), BookingStatus::CancelledByUser);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancel_rules_for_providers_and_late_customers(harness: Harness) {
    let booking = harness.booking_in(BookingStatus::InProgress).await;

    let provider = harness.service.cancel(harness.provider.id, booking.id()).await;
    let customer = harness.service.cancel(harness.farmer.id, booking.id()).await;

    assert!(matches!(provider, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(customer, Err(BookingServiceError::Forbidden(_))));
}

#[rstest]
#[case(BookingStatus::InProgress)]
#[case(BookingStatus::Completed)]
#[case(BookingStatus::CancelledByProvider)]
#[tokio::test(flavor = "multi_thread")]
async fn customer_cancel_past_confirmation_is_forbidden(
    harness: Harness,
    #[case] status: BookingStatus,
) {
    let booking = harness.booking_in(status).await;

    let cancelled = harness.service.cancel(harness.farmer.id, booking.id()).await;
    let via_status = harness
        .service
        .transition(harness.farmer.id, booking.id(), BookingStatus::CancelledByUser)
        .await;
    let stored = harness
        .service
        .get(harness.farmer.id, booking.id())
        .await
        .expect("booking is kept");

    assert!(matches!(cancelled, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(
        via_status,
        Err(BookingServiceError::InvalidTransition { .. })
    ));
    assert_eq!(stored.status(), status);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn self_assigned_provider_may_withdraw_their_own_booking(harness: Harness) {
    let own = harness
        .service
        .create(
            harness.provider.id,
            CreateBookingRequest::new("Hitch inspection")
                .scheduled_for(in_days(3))
                .with_service_provider(harness.provider.id),
        )
        .await
        .expect("provider books their own job");
    let also_own = harness
        .service
        .create(
            harness.provider.id,
            CreateBookingRequest::new("Hitch inspection")
                .scheduled_for(in_days(4))
                .with_service_provider(harness.provider.id),
        )
        .await
        .expect("provider books their own job");

    let withdrawn = harness
        .service
        .transition(harness.provider.id, own.id(), BookingStatus::CancelledByUser)
        .await
        .expect("customer edge is open to the customer");
    let cancelled = harness
        .service
        .cancel(harness.provider.id, also_own.id())
        .await
        .expect("customer cancel is open to the customer");

    assert_eq!(withdrawn.status(), BookingStatus::CancelledByUser);
    let CancelOutcome::Cancelled(kept) = cancelled else {
        panic!("customer cancel must keep the booking");
    };
    assert_eq!(kept.status(), BookingStatus::CancelledByUser);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_is_admin_only(harness: Harness) {
    let booking = harness.booking().await;

    let by_customer = harness.service.delete(harness.farmer.id, booking.id()).await;
    harness
        .service
        .delete(harness.admin.id, booking.id())
        .await
        .expect("admin deletes");
    let again = harness.service.delete(harness.admin.id, booking.id()).await;

    assert!(matches!(by_customer, Err(BookingServiceError::Forbidden(_))));
    assert!(matches!(again, Err(BookingServiceError::NotFound { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn purging_a_tractor_removes_its_bookings(harness: Harness) {
    harness.booking().await;
    harness.booking().await;
    let unrelated = harness
        .service
        .create(
            harness.farmer.id,
            CreateBookingRequest::new("Inspection").scheduled_for(in_days(1)),
        )
        .await
        .expect("booking creation should succeed");

    let denied = harness
        .service
        .purge_tractor_as(harness.farmer.id, harness.tractor.id)
        .await;
    let removed = harness
        .service
        .purge_tractor_as(harness.admin.id, harness.tractor.id)
        .await
        .expect("admin purges");
    let remaining = harness
        .repository
        .list(BookingFilter::All, Page::new(0, 10))
        .await
        .expect("listing");

    assert!(matches!(denied, Err(BookingServiceError::Forbidden(_))));
    assert_eq!(removed, 2);
    assert_eq!(remaining, vec![unrelated]);
}

/// Repository that parks each lookup at a barrier until a second lookup
/// arrives, so two requests observe the same status before either writes.
///
/// When `status_after_edit` is set, status writes also wait until a field
/// edit has landed.
struct GatedRepository {
    inner: InMemoryBookingRepository,
    gate: Barrier,
    status_after_edit: bool,
    edit_landed: Notify,
}

impl GatedRepository {
    fn new(inner: InMemoryBookingRepository) -> Self {
        Self {
            inner,
            gate: Barrier::new(2),
            status_after_edit: false,
            edit_landed: Notify::new(),
        }
    }

    fn with_status_after_edit(inner: InMemoryBookingRepository) -> Self {
        Self {
            status_after_edit: true,
            ..Self::new(inner)
        }
    }
}

#[async_trait]
impl BookingRepository for GatedRepository {
    async fn store(&self, booking: &ServiceBooking) -> BookingRepositoryResult<()> {
        self.inner.store(booking).await
    }

    async fn update(
        &self,
        booking: &ServiceBooking,
        observed: BookingRevision,
    ) -> BookingRepositoryResult<()> {
        let result = self.inner.update(booking, observed).await;
        self.edit_landed.notify_one();
        result
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingRepositoryResult<ServiceBooking> {
        if self.status_after_edit {
            self.edit_landed.notified().await;
        }
        self.inner
            .update_status(id, expected, target, updated_at)
            .await
    }

    async fn find_by_id(&self, id: BookingId) -> BookingRepositoryResult<Option<ServiceBooking>> {
        let found = self.inner.find_by_id(id).await;
        self.gate.wait().await;
        found
    }

    async fn list(
        &self,
        filter: BookingFilter,
        page: Page,
    ) -> BookingRepositoryResult<Vec<ServiceBooking>> {
        self.inner.list(filter, page).await
    }

    async fn delete(&self, id: BookingId) -> BookingRepositoryResult<()> {
        self.inner.delete(id).await
    }

    async fn delete_by_tractor(&self, tractor_id: TractorId) -> BookingRepositoryResult<u64> {
        self.inner.delete_by_tractor(tractor_id).await
    }
}

fn inspection_for(customer: UserId, provider: Option<UserId>) -> ServiceBooking {
    ServiceBooking::new(
        NewBooking {
            customer_id: customer,
            tractor_id: None,
            service_type: ServiceType::new("Inspection").expect("valid service type"),
            description: None,
            scheduled_date: in_days(1),
            service_provider_id: provider,
            notes: None,
        },
        &DefaultClock,
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_transitions_yield_one_success_and_one_conflict() {
    let (directory, [farmer, _, provider, _, _], _) = seeded_directory();
    let inner = InMemoryBookingRepository::new();
    let seed = inspection_for(farmer.id, Some(provider.id));
    inner.store(&seed).await.expect("seed booking");
    let booking_id = seed.id();
    let service = Arc::new(BookingService::new(
        Arc::new(GatedRepository::new(inner)),
        directory,
        Arc::new(RecordingOutbox::new()),
        Arc::new(DefaultClock),
    ));

    let confirm = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .transition(provider.id, booking_id, BookingStatus::Confirmed)
                .await
        })
    };
    let withdraw = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .transition(farmer.id, booking_id, BookingStatus::CancelledByUser)
                .await
        })
    };
    let outcomes = [
        confirm.await.expect("confirm task joins"),
        withdraw.await.expect("withdraw task joins"),
    ];

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(BookingServiceError::Conflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_change_keeps_a_field_edit_that_landed_first() {
    let (directory, [farmer, _, provider, other_provider, admin], _) = seeded_directory();
    let inner = InMemoryBookingRepository::new();
    let seed = inspection_for(farmer.id, Some(provider.id));
    inner.store(&seed).await.expect("seed booking");
    let booking_id = seed.id();
    let repository = Arc::new(GatedRepository::with_status_after_edit(inner));
    let service = Arc::new(BookingService::new(
        Arc::clone(&repository),
        directory,
        Arc::new(RecordingOutbox::new()),
        Arc::new(DefaultClock),
    ));

    let confirm = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .transition(provider.id, booking_id, BookingStatus::Confirmed)
                .await
        })
    };
    let reassign = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .update_fields(
                    admin.id,
                    booking_id,
                    UpdateBookingRequest::new().with_service_provider(other_provider.id),
                )
                .await
        })
    };
    let reassigned = reassign.await.expect("reassign task joins");
    let confirmed = confirm.await.expect("confirm task joins");
    let stored = repository
        .inner
        .find_by_id(booking_id)
        .await
        .expect("lookup")
        .expect("booking still stored");

    assert!(reassigned.is_ok());
    let confirmed = confirmed.expect("status write lands after the edit");
    assert_eq!(stored.status(), BookingStatus::Confirmed);
    assert_eq!(stored.service_provider_id(), Some(other_provider.id));
    assert_eq!(confirmed, stored);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn field_edit_from_a_stale_read_conflicts() {
    let (directory, [farmer, _, provider, _, admin], _) = seeded_directory();
    let repository = Arc::new(InMemoryBookingRepository::new());
    let seed = inspection_for(farmer.id, Some(provider.id));
    repository.store(&seed).await.expect("seed booking");
    let service = BookingService::new(
        Arc::clone(&repository),
        directory,
        Arc::new(RecordingOutbox::new()),
        Arc::new(DefaultClock),
    );
    service
        .update_fields(
            admin.id,
            seed.id(),
            UpdateBookingRequest::new().with_notes("Bring the torque wrench"),
        )
        .await
        .expect("first edit");

    let mut stale = seed.clone();
    stale
        .apply_patch(
            BookingPatch::new().with_description("Overwritten"),
            &DefaultClock,
        )
        .expect("patch applies");
    let result = repository
        .update(&stale, BookingRevision::of(&seed))
        .await;
    let stored = repository
        .find_by_id(seed.id())
        .await
        .expect("lookup")
        .expect("booking still stored");

    assert!(matches!(
        result.map_err(BookingServiceError::from),
        Err(BookingServiceError::Conflict(_))
    ));
    assert_eq!(stored.notes(), Some("Bring the torque wrench"));
    assert_eq!(stored.description(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stalled_storage_surfaces_as_unavailable() {
    let (directory, [farmer, ..], _) = seeded_directory();
    let inner = InMemoryBookingRepository::new();
    let seed = inspection_for(farmer.id, None);
    inner.store(&seed).await.expect("seed booking");
    let service = BookingService::new(
        Arc::new(GatedRepository::new(inner)),
        directory,
        Arc::new(RecordingOutbox::new()),
        Arc::new(DefaultClock),
    )
    .with_config(BookingServiceConfig {
        repository_timeout: Duration::from_millis(50),
        ..BookingServiceConfig::default()
    });

    let result = service.get(farmer.id, seed.id()).await;

    assert!(matches!(result, Err(BookingServiceError::Unavailable(_))));
}
