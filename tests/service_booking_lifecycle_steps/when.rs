//! When steps for service booking lifecycle scenarios.

use super::world::{BookingWorld, participant, run_async};
use farmpower_bookings::booking::{
    domain::BookingStatus,
    services::{CancelOutcome, UpdateBookingRequest},
};
use rstest_bdd_macros::when;

#[when(r#"the provider moves the booking to "{status}""#)]
fn provider_moves_booking(world: &mut BookingWorld, status: String) -> Result<(), eyre::Report> {
    let target = BookingStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let provider = participant(world.provider, "provider")?;
    let booking_id = world.booking()?.id();

    let result = run_async(world.service.transition(provider.id, booking_id, target));
    world.record(result);
    Ok(())
}

#[when("the farmer edits the booking description")]
fn farmer_edits_description(world: &mut BookingWorld) -> Result<(), eyre::Report> {
    let farmer = participant(world.farmer, "farmer")?;
    let booking_id = world.booking()?.id();

    let result = run_async(world.service.update_fields(
        farmer.id,
        booking_id,
        UpdateBookingRequest::new().with_description("Also check the hitch"),
    ));
    world.record(result);
    Ok(())
}

#[when("the farmer cancels the booking")]
fn farmer_cancels(world: &mut BookingWorld) -> Result<(), eyre::Report> {
    let farmer = participant(world.farmer, "farmer")?;
    let booking_id = world.booking()?.id();

    match run_async(world.service.cancel(farmer.id, booking_id)) {
        Ok(CancelOutcome::Cancelled(booking)) => world.record(Ok(booking)),
        Ok(CancelOutcome::Deleted) => {
            return Err(eyre::eyre!("customer cancellation must not delete"));
        }
        Err(err) => world.record(Err(err)),
    }
    Ok(())
}

#[when("another provider looks up the booking")]
fn other_provider_looks_up(world: &mut BookingWorld) -> Result<(), eyre::Report> {
    let other = participant(world.other_provider, "other provider")?;
    let booking_id = world.booking()?.id();

    let result = run_async(world.service.get(other.id, booking_id));
    world.record(result);
    Ok(())
}

#[when("the administrator cancels the booking")]
fn admin_cancels(world: &mut BookingWorld) -> Result<(), eyre::Report> {
    let admin = participant(world.admin, "administrator")?;
    let booking_id = world.booking()?.id();

    let outcome = run_async(world.service.cancel(admin.id, booking_id))
        .map_err(|err| eyre::eyre!("administrator cancel failed: {err}"))?;
    if outcome != CancelOutcome::Deleted {
        return Err(eyre::eyre!("expected hard delete, got {outcome:?}"));
    }
    Ok(())
}
