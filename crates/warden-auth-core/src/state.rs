//! Login state for the OIDC redirect round-trip.
//!
//! The state is sealed with the service's own public key and opened with
//! its private key, so nothing needs to be stored between `login` and
//! `callback`. An opened state must carry the expected tag and must not be
//! older than the configured TTL.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::{constant_time_str_eq, KeyPair};
use crate::error::AuthError;

/// Tag every sealed state carries
pub const STATE_TAG: &str = "warden-login";

/// Allowance for clock drift between replicas sharing a key
const FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct StatePayload {
    tag: String,
    nonce: String,
    iat: i64,
}

/// Seals and opens login state values
#[derive(Clone)]
pub struct StateCipher {
    keys: Arc<KeyPair>,
    ttl: TimeDelta,
}

impl StateCipher {
    pub fn new(keys: Arc<KeyPair>, ttl: Duration) -> Self {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        Self { keys, ttl }
    }

    /// Produce a fresh opaque state value
    pub fn seal(&self) -> Result<String, AuthError> {
        self.seal_at(Utc::now())
    }

    pub fn seal_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let payload = StatePayload {
            tag: STATE_TAG.to_string(),
            nonce: URL_SAFE_NO_PAD.encode(nonce),
            iat: now.timestamp(),
        };
        let plaintext =
            serde_json::to_vec(&payload).map_err(|e| AuthError::Internal(e.to_string()))?;
        let ciphertext = self.keys.encrypt(&plaintext).map_err(|e| {
            tracing::error!(error = %e, "Failed to seal login state");
            AuthError::Internal("failed to seal login state".to_string())
        })?;

        Ok(URL_SAFE_NO_PAD.encode(ciphertext))
    }

    /// Check a state value returned by the provider
    pub fn open(&self, state: &str) -> Result<(), AuthError> {
        self.open_at(state, Utc::now())
    }

    pub fn open_at(&self, state: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let ciphertext = URL_SAFE_NO_PAD.decode(state.trim()).map_err(|_| {
            tracing::debug!("Login state is not base64url");
            AuthError::Unauthorized
        })?;
        let plaintext = self.keys.decrypt(&ciphertext).map_err(|_| {
            tracing::debug!("Login state failed to decrypt");
            AuthError::Unauthorized
        })?;
        let payload: StatePayload = serde_json::from_slice(&plaintext).map_err(|_| {
            tracing::debug!("Login state payload is malformed");
            AuthError::Unauthorized
        })?;

        if !constant_time_str_eq(&payload.tag, STATE_TAG) {
            tracing::debug!("Login state tag mismatch");
            return Err(AuthError::Unauthorized);
        }

        let issued = DateTime::<Utc>::from_timestamp(payload.iat, 0).ok_or_else(|| {
            tracing::debug!("Login state has an invalid timestamp");
            AuthError::Unauthorized
        })?;
        if issued > now + TimeDelta::seconds(FUTURE_SKEW_SECS) {
            tracing::debug!("Login state issued in the future");
            return Err(AuthError::Unauthorized);
        }
        if now - issued > self.ttl {
            tracing::debug!("Login state expired");
            return Err(AuthError::Unauthorized);
        }

        Ok(())
    }
}

impl std::fmt::Debug for StateCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCipher")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
