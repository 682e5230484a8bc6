//! RS256 identity tokens
//!
//! Tokens are self-contained: nothing is stored server-side. Verification
//! reports only valid or invalid so callers cannot learn why a token failed.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use warden_types::{SignedToken, User};

use crate::config::JwtConfig;
use crate::crypto::KeyPair;
use crate::error::AuthError;

/// Claims carried by a Warden token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    /// Permission snapshot taken when the token was issued
    #[serde(rename = "Perms", default)]
    pub perms: Vec<String>,
}

impl TokenClaims {
    /// Expiry as a timestamp; `None` if `exp` is out of range
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether `exp` is in the future relative to `now`
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.exp > now.timestamp()
    }
}

/// Creates, verifies and renews tokens with the service key pair
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<KeyPair>,
    issuer: String,
    audience: String,
    duration: TimeDelta,
    validation: Validation,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Errors
    /// Returns `Configuration` if the configured lifetime is zero or does not
    /// fit in a timestamp delta.
    pub fn new(keys: Arc<KeyPair>, config: &JwtConfig) -> Result<Self, AuthError> {
        let duration = TimeDelta::from_std(config.duration)
            .map_err(|_| AuthError::Configuration("token duration out of range".to_string()))?;
        if duration <= TimeDelta::zero() {
            return Err(AuthError::Configuration(
                "token duration must be positive".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;

        Ok(Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            duration,
            validation,
        })
    }

    /// Configured token lifetime
    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    /// Issue a token for a user
    pub fn create_and_sign(&self, user: &User) -> Result<SignedToken, AuthError> {
        self.create_and_sign_at(user, Utc::now())
    }

    pub fn create_and_sign_at(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, AuthError> {
        let claims = self.stamp(user.subject().to_string(), user.permissions.clone(), now);
        self.sign(&claims)
    }

    /// Verify signature, issuer, audience and expiry
    pub fn verify(&self, token: &str) -> Option<TokenClaims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<TokenClaims> {
        let claims = match decode::<TokenClaims>(token, self.keys.decoding_key(), &self.validation)
        {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(kind = ?e.kind(), "Token rejected");
                return None;
            }
        };

        if !claims.is_live_at(now) {
            tracing::debug!("Token expired");
            return None;
        }
        if claims.sub.is_empty() {
            tracing::debug!("Token has an empty subject");
            return None;
        }

        Some(claims)
    }

    /// Whether a verified token is close enough to expiry to be reissued.
    ///
    /// True when the remaining lifetime is at most half the configured
    /// duration, boundary included.
    pub fn needs_renewal(&self, claims: &TokenClaims, now: DateTime<Utc>) -> bool {
        let remaining_ms = claims
            .exp
            .saturating_mul(1000)
            .saturating_sub(now.timestamp_millis());
        remaining_ms <= self.duration.num_milliseconds() / 2
    }

    /// Re-issue a valid token with a fresh lifetime
    pub fn renew(&self, token: &str) -> Result<SignedToken, AuthError> {
        self.renew_at(token, Utc::now())
    }

    pub fn renew_at(&self, token: &str, now: DateTime<Utc>) -> Result<SignedToken, AuthError> {
        let claims = self.verify_at(token, now).ok_or(AuthError::Unauthorized)?;
        self.renew_claims_at(&claims, now)
    }

    /// Re-issue from claims that the caller has already verified
    pub fn renew_claims_at(
        &self,
        claims: &TokenClaims,
        now: DateTime<Utc>,
    ) -> Result<SignedToken, AuthError> {
        let renewed = self.stamp(claims.sub.clone(), claims.perms.clone(), now);
        self.sign(&renewed)
    }

    fn stamp(&self, sub: String, perms: Vec<String>, now: DateTime<Utc>) -> TokenClaims {
        let iat = now.timestamp();
        TokenClaims {
            iss: self.issuer.clone(),
            sub,
            aud: self.audience.clone(),
            iat,
            exp: iat.saturating_add(self.duration.num_seconds()),
            perms,
        }
    }

    fn sign(&self, claims: &TokenClaims) -> Result<SignedToken, AuthError> {
        let token = encode(
            &Header::new(Algorithm::RS256),
            claims,
            self.keys.encoding_key(),
        )
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to sign token");
            AuthError::Internal("failed to sign token".to_string())
        })?;
        let expiry = claims
            .expires_at()
            .ok_or_else(|| AuthError::Internal("token expiry out of range".to_string()))?;

        Ok(SignedToken { token, expiry })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}
