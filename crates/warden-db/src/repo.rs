//! Repository traits
//!
//! Define async repository interfaces for user storage. Each call is a
//! single atomic read or write; callers never hold locks across calls.

use async_trait::async_trait;
use warden_types::User;

use crate::error::DbResult;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by subject
    async fn find_by_subject(&self, subject: &str) -> DbResult<Option<User>>;

    /// List all users, including soft-deleted ones
    async fn list(&self) -> DbResult<Vec<User>>;

    /// Insert a new user; fails with `Conflict` if the subject exists
    async fn create(&self, user: User) -> DbResult<User>;

    /// Replace an existing user; `None` if the subject is unknown
    async fn update(&self, user: User) -> DbResult<Option<User>>;

    /// Insert or replace by subject
    async fn upsert(&self, user: User) -> DbResult<User>;

    /// Check that the store is reachable
    async fn ping(&self) -> DbResult<()>;
}
