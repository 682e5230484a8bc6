//! Authentication context types.
//!
//! The gate stores an [`Authentication`] in the request extensions. Guards
//! and extractors read it back from there.

use warden_auth_core::permission::{has_all, has_any, PathParams};
use warden_auth_core::TokenClaims;
use warden_types::User;

/// Where the credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Credential cookie.
    Cookie,
    /// Bearer token from the Authorization header.
    BearerToken,
}

impl AuthSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookie => "cookie",
            Self::BearerToken => "bearer",
        }
    }
}

/// An authenticated request's identity.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Stable subject identifier from the token.
    pub subject: String,
    /// User record loaded from the store for this request.
    pub user: User,
    /// Verified token claims.
    pub claims: TokenClaims,
    /// Source of the credential.
    pub source: AuthSource,
    /// Whether the gate issued a renewed token on this request.
    pub renewed: bool,
}

impl AuthContext {
    /// Create a context from a verified token and its user.
    #[must_use]
    pub fn new(user: User, claims: TokenClaims) -> Self {
        Self {
            subject: claims.sub.clone(),
            user,
            claims,
            source: AuthSource::Cookie,
            renewed: false,
        }
    }

    /// Set the auth source.
    #[must_use]
    pub fn with_source(mut self, source: AuthSource) -> Self {
        self.source = source;
        self
    }

    /// Mark the context as carrying a renewed token.
    #[must_use]
    pub fn with_renewed(mut self, renewed: bool) -> Self {
        self.renewed = renewed;
        self
    }

    /// Scopes held by the user, as currently stored.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.user.permissions
    }

    /// Check whether the user holds any of `required`.
    #[must_use]
    pub fn has_any<R, P>(&self, required: &[R], params: &P) -> bool
    where
        R: AsRef<str>,
        P: PathParams + ?Sized,
    {
        has_any(self.permissions(), required, params)
    }

    /// Check whether the user holds all of `required`.
    #[must_use]
    pub fn has_all<R, P>(&self, required: &[R], params: &P) -> bool
    where
        R: AsRef<str>,
        P: PathParams + ?Sized,
    {
        has_all(self.permissions(), required, params)
    }
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone)]
pub enum Authentication {
    Authenticated(AuthContext),
    /// No valid identity; only produced by a non-cancelling gate.
    Anonymous,
}

impl Authentication {
    #[must_use]
    pub fn context(&self) -> Option<&AuthContext> {
        match self {
            Self::Authenticated(ctx) => Some(ctx),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn into_context(self) -> Option<AuthContext> {
        match self {
            Self::Authenticated(ctx) => Some(ctx),
            Self::Anonymous => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
