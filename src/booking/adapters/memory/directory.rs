//! In-memory user directory and tractor registry.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::booking::{
    domain::{Tractor, TractorId, User, UserId},
    ports::{DirectoryError, DirectoryResult, TractorRegistry, UserDirectory},
};

/// Thread-safe directory holding users and tractors in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<UserId, User>,
    tractors: HashMap<TractorId, Tractor>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn insert_user(&self, user: User) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.users.insert(user.id, user);
    }

    /// Adds or replaces a tractor.
    pub fn insert_tractor(&self, tractor: Tractor) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.tractors.insert(tractor.id, tractor);
    }

    /// Removes a tractor, returning it when it was registered.
    pub fn remove_tractor(&self, id: TractorId) -> Option<Tractor> {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        state.tractors.remove(&id)
    }
}

fn poisoned(err: impl std::fmt::Display) -> DirectoryError {
    DirectoryError::unavailable(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.users.get(&id).copied())
    }
}

#[async_trait]
impl TractorRegistry for InMemoryDirectory {
    async fn find_tractor(&self, id: TractorId) -> DirectoryResult<Option<Tractor>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tractors.get(&id).copied())
    }
}
