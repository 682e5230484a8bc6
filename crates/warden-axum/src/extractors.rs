//! Axum extractors for the identity attached by the gate.
//!
//! # Usage
//!
//! ```ignore
//! use warden_axum::{MaybeAuth, RequireAuth};
//!
//! // Requires authentication (401 if not authenticated)
//! async fn me(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.subject)
//! }
//!
//! // Optional authentication, behind a non-cancelling gate
//! async fn home(auth: MaybeAuth) -> String {
//!     match auth.0 {
//!         Some(ctx) => format!("Hello, {}!", ctx.subject),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::context::{AuthContext, Authentication};
use crate::error::GateError;

fn context_from(parts: &Parts) -> Option<AuthContext> {
    parts
        .extensions
        .get::<Authentication>()
        .and_then(Authentication::context)
        .cloned()
}

/// Extractor that requires authentication.
///
/// Returns 401 Unauthorized if no identity is attached.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthContext);

impl Deref for RequireAuth {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_from(parts)
            .map(Self)
            .ok_or(GateError::Unauthenticated)
    }
}

/// Extractor for optional authentication.
///
/// Returns `None` for anonymous requests rather than failing.
#[derive(Debug, Clone)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl Deref for MaybeAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(context_from(parts)))
    }
}
