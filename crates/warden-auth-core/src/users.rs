//! User management on top of the user store

use std::sync::Arc;

use warden_db::UserRepository;
use warden_types::{FieldErrors, User};

use crate::error::AuthError;
use crate::permission::validate_permission_list;

/// Validates and persists user records
pub struct UserService<R: UserRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: UserRepository + ?Sized> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: UserRepository + ?Sized> UserService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The underlying store
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Look up a user, `None` if unknown
    pub async fn find(&self, subject: &str) -> Result<Option<User>, AuthError> {
        Ok(self.repo.find_by_subject(subject).await?)
    }

    /// Look up a user, `NotFound` if unknown
    pub async fn get(&self, subject: &str) -> Result<User, AuthError> {
        if subject.trim().is_empty() {
            return Err(AuthError::invalid_field("sub", "must not be blank"));
        }
        self.find(subject)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<User>, AuthError> {
        Ok(self.repo.list().await?)
    }

    /// Create a new user from a client-supplied record
    #[tracing::instrument(skip_all, fields(subject = %user.claims.sub))]
    pub async fn create(&self, user: User) -> Result<User, AuthError> {
        let user = prepare(user)?;
        let created = self.repo.create(user).await?;
        tracing::info!("User created");
        Ok(created)
    }

    /// Replace the user at `subject`. The body must name the same subject.
    #[tracing::instrument(skip(self, user))]
    pub async fn update(&self, subject: &str, user: User) -> Result<User, AuthError> {
        if user.claims.sub != subject {
            return Err(AuthError::invalid_field(
                "claims.sub",
                "must match the subject in the path",
            ));
        }
        let mut user = prepare(user)?;
        let existing = self.get(subject).await?;
        user.id = existing.id;

        self.repo
            .update(user)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))
    }

    /// Mark a user deleted. The record is kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, subject: &str) -> Result<User, AuthError> {
        let mut user = self.get(subject).await?;
        user.deleted = true;
        let user = self
            .repo
            .update(user)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))?;
        tracing::info!("User soft-deleted");
        Ok(user)
    }

    /// Insert or replace without client-input validation
    pub async fn save(&self, user: User) -> Result<User, AuthError> {
        Ok(self.repo.upsert(user).await?)
    }

    /// Check that the store is reachable
    pub async fn ping(&self) -> Result<(), AuthError> {
        Ok(self.repo.ping().await?)
    }
}

impl<R: UserRepository + ?Sized> std::fmt::Debug for UserService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

/// Validate a client-supplied user and normalise its permissions
fn prepare(mut user: User) -> Result<User, AuthError> {
    let mut errors = FieldErrors::new();
    if user.claims.sub.trim().is_empty() {
        errors.add("claims.sub", "must not be blank");
    }
    if let Err(bad) = validate_permission_list("permissions", &user.permissions) {
        errors.0.extend(bad.0);
    }
    errors.into_result()?;

    let permissions = std::mem::take(&mut user.permissions);
    user.set_permissions(permissions);
    Ok(user)
}
