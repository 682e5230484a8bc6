//! In-memory user store

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use warden_types::User;

use crate::error::{DbError, DbResult};
use crate::repo::UserRepository;

/// `DashMap`-backed user repository keyed by subject.
///
/// Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<DashMap<String, User>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, bypassing conflict checks
    pub fn insert_user(&self, user: User) {
        self.users.insert(user.subject().to_string(), user);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Make every subsequent call fail with `Unavailable`.
    ///
    /// Used to exercise outage handling in callers.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            tracing::warn!("in-memory store marked unavailable");
            return Err(DbError::Unavailable("in-memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_subject(&self, subject: &str) -> DbResult<Option<User>> {
        self.check_available()?;
        Ok(self.users.get(subject).map(|r| r.value().clone()))
    }

    async fn list(&self) -> DbResult<Vec<User>> {
        self.check_available()?;
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| a.claims.sub.cmp(&b.claims.sub));
        Ok(users)
    }

    async fn create(&self, user: User) -> DbResult<User> {
        self.check_available()?;
        match self.users.entry(user.subject().to_string()) {
            Entry::Occupied(_) => Err(DbError::Conflict(user.subject().to_string())),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn update(&self, user: User) -> DbResult<Option<User>> {
        self.check_available()?;
        match self.users.get_mut(user.subject()) {
            Some(mut existing) => {
                *existing = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, user: User) -> DbResult<User> {
        self.check_available()?;
        self.users.insert(user.subject().to_string(), user.clone());
        Ok(user)
    }

    async fn ping(&self) -> DbResult<()> {
        self.check_available()
    }
}
