//! `PostgreSQL` repository implementation for booking storage.

use super::{
    models::{BookingChangeset, BookingRow, NewBookingRow},
    schema::service_bookings,
};
use crate::booking::{
    domain::{
        BookingId, BookingStatus, PersistedBookingData, ServiceBooking, ServiceType, TractorId,
        UserId,
    },
    ports::{
        BookingFilter, BookingRepository, BookingRepositoryError, BookingRepositoryResult,
        BookingRevision, Page,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by booking adapters.
pub type BookingPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed booking repository.
///
/// Conditional writes are single `UPDATE` statements guarded on the observed
/// status (and, for field edits, the observed `updated_at`), so concurrent
/// writers are reconciled by the database.
#[derive(Debug, Clone)]
pub struct PostgresBookingRepository {
    pool: BookingPgPool,
}

impl PostgresBookingRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BookingPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BookingRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BookingRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BookingRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BookingRepositoryError::persistence)?
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn store(&self, booking: &ServiceBooking) -> BookingRepositoryResult<()> {
        let booking_id = booking.id();
        let new_row = to_new_row(booking);

        self.run_blocking(move |connection| {
            diesel::insert_into(service_bookings::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BookingRepositoryError::DuplicateBooking(booking_id)
                    }
                    _ => BookingRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        booking: &ServiceBooking,
        observed: BookingRevision,
    ) -> BookingRepositoryResult<()> {
        let booking_id = booking.id();
        let changeset = to_changeset(booking);

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                service_bookings::table
                    .filter(service_bookings::id.eq(booking_id.into_inner()))
                    .filter(service_bookings::status.eq(observed.status.as_str()))
                    .filter(service_bookings::updated_at.eq(observed.updated_at)),
            )
            .set(changeset)
            .execute(connection)
            .map_err(BookingRepositoryError::persistence)?;

            if affected > 0 {
                return Ok(());
            }
            Err(explain_missed_write(connection, booking_id, observed.status)?)
        })
        .await
    }

    async fn update_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        target: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> BookingRepositoryResult<ServiceBooking> {
        self.run_blocking(move |connection| {
            let row = diesel::update(
                service_bookings::table
                    .filter(service_bookings::id.eq(id.into_inner()))
                    .filter(service_bookings::status.eq(expected.as_str())),
            )
            .set((
                service_bookings::status.eq(target.as_str()),
                service_bookings::updated_at.eq(updated_at),
            ))
            .returning(BookingRow::as_returning())
            .get_result::<BookingRow>(connection)
            .optional()
            .map_err(BookingRepositoryError::persistence)?;

            match row {
                Some(stored) => row_to_booking(stored),
                None => Err(explain_missed_write(connection, id, expected)?),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: BookingId) -> BookingRepositoryResult<Option<ServiceBooking>> {
        self.run_blocking(move |connection| {
            let row = service_bookings::table
                .filter(service_bookings::id.eq(id.into_inner()))
                .select(BookingRow::as_select())
                .first::<BookingRow>(connection)
                .optional()
                .map_err(BookingRepositoryError::persistence)?;
            row.map(row_to_booking).transpose()
        })
        .await
    }

    async fn list(
        &self,
        filter: BookingFilter,
        page: Page,
    ) -> BookingRepositoryResult<Vec<ServiceBooking>> {
        let offset = i64::try_from(page.offset).map_err(BookingRepositoryError::persistence)?;
        let limit = i64::try_from(page.limit).map_err(BookingRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            let mut query: service_bookings::BoxedQuery<'_, Pg> =
                service_bookings::table.into_boxed();
            query = match filter {
                BookingFilter::All => query,
                BookingFilter::Customer(id) => {
                    query.filter(service_bookings::customer_id.eq(id.into_inner()))
                }
                BookingFilter::Provider(id) => {
                    query.filter(service_bookings::service_provider_id.eq(id.into_inner()))
                }
                BookingFilter::Tractor(id) => {
                    query.filter(service_bookings::tractor_id.eq(id.into_inner()))
                }
            };

            let rows = query
                .order((
                    service_bookings::scheduled_date.desc(),
                    service_bookings::id.asc(),
                ))
                .offset(offset)
                .limit(limit)
                .load::<BookingRow>(connection)
                .map_err(BookingRepositoryError::persistence)?;
            rows.into_iter().map(row_to_booking).collect()
        })
        .await
    }

    async fn delete(&self, id: BookingId) -> BookingRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                service_bookings::table.filter(service_bookings::id.eq(id.into_inner())),
            )
            .execute(connection)
            .map_err(BookingRepositoryError::persistence)?;
            if removed == 0 {
                return Err(BookingRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_by_tractor(&self, tractor_id: TractorId) -> BookingRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                service_bookings::table
                    .filter(service_bookings::tractor_id.eq(tractor_id.into_inner())),
            )
            .execute(connection)
            .map_err(BookingRepositoryError::persistence)?;
            u64::try_from(removed).map_err(BookingRepositoryError::persistence)
        })
        .await
    }
}

fn to_new_row(booking: &ServiceBooking) -> NewBookingRow {
    NewBookingRow {
        id: booking.id().into_inner(),
        customer_id: booking.customer_id().into_inner(),
        tractor_id: booking.tractor_id().map(TractorId::into_inner),
        service_type: booking.service_type().as_str().to_owned(),
        description: booking.description().map(str::to_owned),
        scheduled_date: booking.scheduled_date(),
        status: booking.status().as_str().to_owned(),
        service_provider_id: booking.service_provider_id().map(UserId::into_inner),
        notes: booking.notes().map(str::to_owned),
        created_at: booking.created_at(),
        updated_at: booking.updated_at(),
    }
}

fn to_changeset(booking: &ServiceBooking) -> BookingChangeset {
    BookingChangeset {
        tractor_id: booking.tractor_id().map(TractorId::into_inner),
        service_type: booking.service_type().as_str().to_owned(),
        description: booking.description().map(str::to_owned),
        scheduled_date: booking.scheduled_date(),
        service_provider_id: booking.service_provider_id().map(UserId::into_inner),
        notes: booking.notes().map(str::to_owned),
        updated_at: booking.updated_at(),
    }
}

/// Works out why a conditional write matched no row.
fn explain_missed_write(
    connection: &mut PgConnection,
    booking_id: BookingId,
    expected: BookingStatus,
) -> BookingRepositoryResult<BookingRepositoryError> {
    let current = service_bookings::table
        .filter(service_bookings::id.eq(booking_id.into_inner()))
        .select(service_bookings::status)
        .first::<String>(connection)
        .optional()
        .map_err(BookingRepositoryError::persistence)?;

    let Some(raw) = current else {
        return Ok(BookingRepositoryError::NotFound(booking_id));
    };
    let actual = parse_status(&raw)?;
    if actual == expected {
        return Ok(BookingRepositoryError::StaleRevision(booking_id));
    }
    Ok(BookingRepositoryError::StatusConflict {
        booking_id,
        expected,
        actual,
    })
}

fn parse_status(raw: &str) -> BookingRepositoryResult<BookingStatus> {
    BookingStatus::try_from(raw).map_err(BookingRepositoryError::persistence)
}

fn row_to_booking(row: BookingRow) -> BookingRepositoryResult<ServiceBooking> {
    let BookingRow {
        id,
        customer_id,
        tractor_id,
        service_type,
        description,
        scheduled_date,
        status,
        service_provider_id,
        notes,
        created_at,
        updated_at,
    } = row;

    let data = PersistedBookingData {
        id: BookingId::from_uuid(id),
        customer_id: UserId::from_uuid(customer_id),
        tractor_id: tractor_id.map(TractorId::from_uuid),
        service_type: ServiceType::new(service_type)
            .map_err(BookingRepositoryError::persistence)?,
        description,
        scheduled_date,
        status: parse_status(&status)?,
        service_provider_id: service_provider_id.map(UserId::from_uuid),
        notes,
        created_at,
        updated_at,
    };
    Ok(ServiceBooking::from_persisted(data))
}
