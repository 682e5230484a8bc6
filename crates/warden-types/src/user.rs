//! User types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::claims::StandardClaims;

/// Unique user record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random user ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// An authenticated principal.
///
/// Users are keyed by the provider `sub` claim. Records are never removed;
/// deletion only flips [`User::deleted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    pub claims: StandardClaims,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl User {
    /// Create a fresh user record for a subject with no permissions
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            claims: StandardClaims::for_subject(subject),
            permissions: Vec::new(),
            deleted: false,
        }
    }

    /// The stable external identifier
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// Replace the permission set, lower-casing and de-duplicating entries.
    ///
    /// First occurrence wins, so the stored order follows the input.
    #[must_use]
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_permissions(permissions);
        self
    }

    /// In-place form of [`User::with_permissions`]
    pub fn set_permissions<I, S>(&mut self, permissions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.permissions = normalize_permissions(permissions);
    }
}

/// Lower-case and de-duplicate permission scopes, keeping first-seen order.
pub fn normalize_permissions<I, S>(permissions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for permission in permissions {
        let lowered = permission.as_ref().trim().to_lowercase();
        if !out.contains(&lowered) {
            out.push(lowered);
        }
    }
    out
}
