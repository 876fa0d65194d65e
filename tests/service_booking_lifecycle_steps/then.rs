//! Then steps for service booking lifecycle scenarios.

use super::world::{BookingWorld, participant, run_async};
use farmpower_bookings::booking::{
    domain::{BookingStatus, UserId},
    services::BookingServiceError,
};
use rstest_bdd_macros::then;

#[then(r#"the booking status is "{status}""#)]
fn booking_status_is(world: &BookingWorld, status: String) -> Result<(), eyre::Report> {
    let expected = BookingStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    if let Some(err) = &world.last_error {
        return Err(eyre::eyre!("last operation failed: {err}"));
    }

    let booking = world.booking()?;
    if booking.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            booking.status()
        ));
    }
    Ok(())
}

#[then("the request is forbidden")]
fn request_is_forbidden(world: &BookingWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(BookingServiceError::Forbidden(_)) => Ok(()),
        other => Err(eyre::eyre!("expected Forbidden error, got {other:?}")),
    }
}

#[then("the request fails with an invalid transition")]
fn request_fails_with_invalid_transition(world: &BookingWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(BookingServiceError::InvalidTransition { .. }) => Ok(()),
        other => Err(eyre::eyre!("expected InvalidTransition error, got {other:?}")),
    }
}

#[then(r#"the booking remains "{status}""#)]
fn booking_remains(world: &BookingWorld, status: String) -> Result<(), eyre::Report> {
    let expected = BookingStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let admin = participant(world.admin, "administrator")?;
    let booking_id = world.booking()?.id();

    let stored = run_async(world.service.get(admin.id, booking_id))
        .map_err(|err| eyre::eyre!("booking lookup failed: {err}"))?;
    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected stored status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

fn notified(world: &BookingWorld, who: &str, recipient: UserId) -> Result<(), eyre::Report> {
    let booking_id = world.booking()?.id();
    let delivered = world
        .outbox
        .published()
        .iter()
        .any(|notice| notice.recipient == recipient && notice.related_entity_id == booking_id);
    if !delivered {
        return Err(eyre::eyre!("expected a notification for the {who}"));
    }
    Ok(())
}

#[then("the farmer has been notified")]
fn farmer_notified(world: &BookingWorld) -> Result<(), eyre::Report> {
    let farmer = participant(world.farmer, "farmer")?;
    notified(world, "farmer", farmer.id)
}

#[then("the provider has been notified")]
fn provider_notified(world: &BookingWorld) -> Result<(), eyre::Report> {
    let provider = participant(world.provider, "provider")?;
    notified(world, "provider", provider.id)
}

#[then("the booking no longer exists")]
fn booking_no_longer_exists(world: &BookingWorld) -> Result<(), eyre::Report> {
    let admin = participant(world.admin, "administrator")?;
    let booking_id = world.booking()?.id();

    match run_async(world.service.get(admin.id, booking_id)) {
        Err(BookingServiceError::NotFound { .. }) => Ok(()),
        other => Err(eyre::eyre!("expected NotFound, got {other:?}")),
    }
}
