//! Schema installation and tractor mirroring.

use super::{models::TractorRow, schema::tractors};
use crate::booking::domain::Tractor;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;

const CREATE_SERVICE_BOOKINGS: &str =
    include_str!("../../../../migrations/2026-03-02-000000_create_service_bookings/up.sql");

/// Applies the bundled schema. Every statement is idempotent.
///
/// # Errors
///
/// Returns the database error when a statement fails.
pub fn apply_migrations(connection: &mut PgConnection) -> QueryResult<()> {
    connection.batch_execute(CREATE_SERVICE_BOOKINGS)
}

/// Upserts tractor ownership so bookings can reference the tractors.
///
/// # Errors
///
/// Returns the database error when an upsert fails.
pub fn mirror_tractors(connection: &mut PgConnection, registry: &[Tractor]) -> QueryResult<usize> {
    let mut written = 0;
    for tractor in registry {
        let row = TractorRow {
            id: tractor.id.into_inner(),
            owner_id: tractor.owner_id.into_inner(),
        };
        written += diesel::insert_into(tractors::table)
            .values(&row)
            .on_conflict(tractors::id)
            .do_update()
            .set(tractors::owner_id.eq(row.owner_id))
            .execute(connection)?;
    }
    Ok(written)
}
