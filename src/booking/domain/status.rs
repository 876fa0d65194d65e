//! Booking status and the authoritative transition table.

use super::ParseBookingStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a service booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Requested by the customer, not yet accepted.
    Pending,
    /// Accepted and scheduled by the provider.
    Confirmed,
    /// Service work has started.
    InProgress,
    /// Service work is finished.
    Completed,
    /// Withdrawn by the customer.
    CancelledByUser,
    /// Declined or abandoned by the provider.
    CancelledByProvider,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::CancelledByUser,
        Self::CancelledByProvider,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CancelledByUser => "cancelled_by_user",
            Self::CancelledByProvider => "cancelled_by_provider",
        }
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CancelledByUser | Self::CancelledByProvider
        )
    }

    /// Returns the statuses reachable from this one in a single step.
    #[must_use]
    pub const fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Pending => &[
                Self::Confirmed,
                Self::CancelledByUser,
                Self::CancelledByProvider,
            ],
            Self::Confirmed => &[
                Self::InProgress,
                Self::CancelledByUser,
                Self::CancelledByProvider,
            ],
            Self::InProgress => &[Self::Completed, Self::CancelledByProvider],
            Self::Completed | Self::CancelledByUser | Self::CancelledByProvider => &[],
        }
    }

    /// Returns `true` when `target` is reachable from this status.
    ///
    /// Self-loops are never allowed.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.allowed_targets().contains(&target)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BookingStatus {
    type Error = ParseBookingStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled_by_user" => Ok(Self::CancelledByUser),
            "cancelled_by_provider" => Ok(Self::CancelledByProvider),
            _ => Err(ParseBookingStatusError(value.to_owned())),
        }
    }
}
