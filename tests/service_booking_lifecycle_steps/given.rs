//! Given steps for service booking lifecycle scenarios.

use super::world::{BookingWorld, participant, run_async};
use chrono::{TimeDelta, Utc};
use eyre::WrapErr;
use farmpower_bookings::booking::{
    domain::{BookingStatus, Tractor, TractorId, User, UserId, UserRole},
    services::CreateBookingRequest,
};
use rstest_bdd_macros::given;

#[given("a farmer who owns a tractor")]
fn farmer_with_tractor(world: &mut BookingWorld) {
    let farmer = User::new(UserId::new(), UserRole::Farmer);
    let tractor = Tractor {
        id: TractorId::new(),
        owner_id: farmer.id,
    };
    world.directory.insert_user(farmer);
    world.directory.insert_tractor(tractor);
    world.farmer = Some(farmer);
    world.tractor = Some(tractor);
}

#[given("a service provider and an administrator")]
fn provider_and_admin(world: &mut BookingWorld) {
    let provider = User::new(UserId::new(), UserRole::ServiceProvider);
    let other_provider = User::new(UserId::new(), UserRole::ServiceProvider);
    let admin = User::new(UserId::new(), UserRole::Admin);
    for user in [provider, other_provider, admin] {
        world.directory.insert_user(user);
    }
    world.provider = Some(provider);
    world.other_provider = Some(other_provider);
    world.admin = Some(admin);
}

#[given(r#"the farmer has booked "{service_type}" with the provider"#)]
fn farmer_has_booked(
    world: &mut BookingWorld,
    service_type: String,
) -> Result<(), eyre::Report> {
    let farmer = participant(world.farmer, "farmer")?;
    let provider = participant(world.provider, "provider")?;
    let tractor = world
        .tractor
        .ok_or_else(|| eyre::eyre!("missing tractor in scenario world"))?;

    let request = CreateBookingRequest::new(service_type)
        .scheduled_for(Utc::now() + TimeDelta::days(7))
        .with_tractor(tractor.id)
        .with_service_provider(provider.id);
    let booking = run_async(world.service.create(farmer.id, request))
        .wrap_err("create booking for lifecycle scenario")?;
    world.booking = Some(booking);
    Ok(())
}

#[given(r#"the provider has moved the booking to "{status}""#)]
fn provider_has_moved_booking(
    world: &mut BookingWorld,
    status: String,
) -> Result<(), eyre::Report> {
    let target = BookingStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let provider = participant(world.provider, "provider")?;
    let booking_id = world.booking()?.id();

    let moved = run_async(world.service.transition(provider.id, booking_id, target))
        .wrap_err("transition booking in scenario setup")?;
    world.booking = Some(moved);
    Ok(())
}
