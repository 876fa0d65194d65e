//! Directory records consumed by the booking domain.

use super::{ParseUserRoleError, TractorId, UserId};
use serde::{Deserialize, Serialize};

/// Role carried by a directory user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Farm operator; books services as a customer.
    Farmer,
    /// Equipment dealer; books services as a customer.
    Dealer,
    /// Performs maintenance work for assigned bookings.
    ServiceProvider,
    /// Unrestricted view, transition, and delete rights.
    Admin,
}

impl UserRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Dealer => "dealer",
            Self::ServiceProvider => "service_provider",
            Self::Admin => "admin",
        }
    }

    /// Returns `true` for roles that may be assigned to fulfil a booking.
    #[must_use]
    pub const fn can_fulfil_bookings(self) -> bool {
        matches!(self, Self::ServiceProvider | Self::Admin)
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ParseUserRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "farmer" => Ok(Self::Farmer),
            "dealer" => Ok(Self::Dealer),
            "service_provider" => Ok(Self::ServiceProvider),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseUserRoleError(value.to_owned())),
        }
    }
}

/// A user as resolved from the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Directory identifier.
    pub id: UserId,
    /// Role used for authorization decisions.
    pub role: UserRole,
    /// Inactive or banned users may not act on bookings.
    pub is_active: bool,
}

impl User {
    /// Creates an active user.
    #[must_use]
    pub const fn new(id: UserId, role: UserRole) -> Self {
        Self {
            id,
            role,
            is_active: true,
        }
    }

    /// Marks the user as inactive.
    #[must_use]
    pub const fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Returns `true` when the user holds the administrator role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

/// A tractor as resolved from the tractor registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tractor {
    /// Registry identifier.
    pub id: TractorId,
    /// Customer who owns the tractor.
    pub owner_id: UserId,
}
