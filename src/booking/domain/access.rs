//! Authorization guard for booking operations.
//!
//! Every decision is a pure function of the acting [`User`] and the
//! [`ServiceBooking`] it targets. The actor's standing towards the booking is
//! first classified as a [`Relationship`]; the predicates then consult that
//! classification and, for status changes, the transition table in
//! [`BookingStatus`].

use super::{BookingStatus, ServiceBooking, User};

/// How an actor relates to a particular booking.
///
/// Classification is ordered: an administrator is always [`Self::Admin`],
/// then the assigned provider, then the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// Administrator, regardless of any other link to the booking.
    Admin,
    /// The provider assigned to fulfil the booking.
    AssignedProvider,
    /// The customer who requested the booking.
    Customer,
    /// No link to the booking.
    Stranger,
}

impl Relationship {
    /// Classifies `actor` with respect to `booking`.
    #[must_use]
    pub fn of(actor: &User, booking: &ServiceBooking) -> Self {
        if actor.is_admin() {
            Self::Admin
        } else if booking.service_provider_id() == Some(actor.id) {
            Self::AssignedProvider
        } else if booking.customer_id() == actor.id {
            Self::Customer
        } else {
            Self::Stranger
        }
    }
}

/// Returns `true` when `actor` may read `booking`.
#[must_use]
pub fn can_view(actor: &User, booking: &ServiceBooking) -> bool {
    !matches!(Relationship::of(actor, booking), Relationship::Stranger)
}

/// Returns `true` when `actor` may edit the non-status fields of `booking`.
///
/// Customers lose edit rights once the booking leaves
/// [`BookingStatus::Pending`].
#[must_use]
pub fn can_edit_fields(actor: &User, booking: &ServiceBooking) -> bool {
    match Relationship::of(actor, booking) {
        Relationship::Admin | Relationship::AssignedProvider => true,
        Relationship::Customer => booking.status() == BookingStatus::Pending,
        Relationship::Stranger => false,
    }
}

/// Returns `true` when `actor` may assign a provider or append notes.
#[must_use]
pub fn can_manage_fulfilment(actor: &User, booking: &ServiceBooking) -> bool {
    matches!(
        Relationship::of(actor, booking),
        Relationship::Admin | Relationship::AssignedProvider
    )
}

/// Returns `true` when `actor` requested `booking`.
///
/// Unlike [`Relationship::of`], this holds even when the customer is also
/// the assigned provider.
#[must_use]
pub fn is_customer(actor: &User, booking: &ServiceBooking) -> bool {
    booking.customer_id() == actor.id
}

/// Returns `true` when `actor` may withdraw `booking` as its customer.
#[must_use]
pub fn can_withdraw(actor: &User, booking: &ServiceBooking) -> bool {
    is_customer(actor, booking)
        && matches!(
            booking.status(),
            BookingStatus::Pending | BookingStatus::Confirmed
        )
}

/// Returns `true` when the actor's role rules allow requesting `target`.
///
/// This ignores the transition table; it answers only whether this kind of
/// actor is ever allowed to ask for this edge from the current status.
#[must_use]
pub fn role_permits_transition(
    actor: &User,
    booking: &ServiceBooking,
    target: BookingStatus,
) -> bool {
    if target == BookingStatus::CancelledByUser && can_withdraw(actor, booking) {
        return true;
    }
    match Relationship::of(actor, booking) {
        Relationship::Admin => true,
        Relationship::AssignedProvider => matches!(
            target,
            BookingStatus::Confirmed
                | BookingStatus::InProgress
                | BookingStatus::Completed
                | BookingStatus::CancelledByProvider
        ),
        Relationship::Customer | Relationship::Stranger => false,
    }
}

/// Returns `true` when `actor` may move `booking` to `target` right now.
///
/// Role rules are always intersected with the structural transition table.
#[must_use]
pub fn can_transition(actor: &User, booking: &ServiceBooking, target: BookingStatus) -> bool {
    role_permits_transition(actor, booking, target) && booking.status().can_transition_to(target)
}

/// Returns `true` when `actor` may hard-delete bookings.
#[must_use]
pub const fn can_delete(actor: &User) -> bool {
    actor.is_admin()
}
