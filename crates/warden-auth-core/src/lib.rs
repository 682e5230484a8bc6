//! Warden Auth Core - Authentication business logic
//!
//! Core functionality for OIDC login, RS256 token issuance and renewal,
//! and permission scope matching.
//!
//! # Overview
//!
//! - [`AuthService`] drives the authorization-code login against an OIDC
//!   provider and issues tokens for the resulting user
//! - [`TokenService`] creates, verifies and renews tokens
//! - [`permission`] evaluates `resource:action:target` scopes
//! - [`UserService`] validates and persists user records through a
//!   [`warden_db::UserRepository`]

pub mod catalog;
pub mod config;
pub mod crypto;
pub mod error;
pub mod oidc;
pub mod permission;
pub mod service;
pub mod state;
pub mod token;
pub mod users;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use catalog::{PermissionCatalog, BUILT_IN_PERMISSIONS};
pub use config::*;
pub use crypto::{constant_time_str_eq, KeyError, KeyPair, MIN_KEY_BITS};
pub use error::*;
pub use oidc::{OidcClient, ProviderMetadata, ProviderTokens};
pub use permission::{has_all, has_any, MatchMode, PathParams, PermissionError};
pub use service::*;
pub use state::StateCipher;
pub use token::{TokenClaims, TokenService};
pub use users::UserService;
