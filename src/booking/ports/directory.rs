//! Lookup ports for users and tractors owned by other subsystems.

use crate::booking::domain::{Tractor, TractorId, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Resolves user identifiers to role-bearing user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by identifier.
    ///
    /// Returns `None` when the user does not exist.
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>>;
}

/// Resolves tractor identifiers to ownership records.
#[async_trait]
pub trait TractorRegistry: Send + Sync {
    /// Finds a tractor by identifier.
    ///
    /// Returns `None` when the tractor does not exist.
    async fn find_tractor(&self, id: TractorId) -> DirectoryResult<Option<Tractor>>;
}

/// Errors returned by directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The backing directory could not be reached.
    #[error("directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a lookup failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
