//! Known permission scopes

use crate::config::PermissionsConfig;
use crate::permission::{normalize_scopes, PermissionError};

/// Scopes every deployment knows about
pub const BUILT_IN_PERMISSIONS: &[&str] = &[
    "users:create:*",
    "users:update:*",
    "users:delete:*",
    "users:get:*",
    "users:list:*",
    "token:get:*",
    "permissions:list:*",
];

/// Built-in plus configured scopes, and the defaults granted at first login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    all: Vec<String>,
    defaults: Vec<String>,
}

impl PermissionCatalog {
    /// Build a catalog, validating every configured scope
    pub fn new(config: &PermissionsConfig) -> Result<Self, PermissionError> {
        let custom = normalize_scopes(&config.custom)?;
        let defaults = dedup(normalize_scopes(&config.default)?);

        let mut all: Vec<String> = BUILT_IN_PERMISSIONS.iter().map(|s| s.to_string()).collect();
        all.extend(custom);

        Ok(Self {
            all: dedup(all),
            defaults,
        })
    }

    /// Every known scope, lower-cased
    pub fn list(&self) -> &[String] {
        &self.all
    }

    /// Scopes granted to a user with no permissions
    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }
}

fn dedup(scopes: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(scopes.len());
    for scope in scopes {
        if !out.contains(&scope) {
            out.push(scope);
        }
    }
    out
}
