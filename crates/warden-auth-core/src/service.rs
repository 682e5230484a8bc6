//! Auth service - login, callback and token issuance

use std::sync::Arc;

use serde::Deserialize;
use url::Url;
use warden_db::UserRepository;
use warden_types::{SignedToken, User};

use crate::catalog::PermissionCatalog;
use crate::config::AuthConfig;
use crate::crypto::KeyPair;
use crate::error::AuthError;
use crate::oidc::OidcClient;
use crate::state::StateCipher;
use crate::token::TokenService;
use crate::users::UserService;

/// Query parameters the provider sends back to the callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Provider name, informational only
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Main auth service.
///
/// Generic over the user store so tests can run against the in-memory
/// backend and production against any other implementation.
pub struct AuthService<R: UserRepository + ?Sized> {
    oidc: OidcClient,
    state: StateCipher,
    tokens: TokenService,
    users: UserService<R>,
    catalog: PermissionCatalog,
}

impl<R: UserRepository + ?Sized> AuthService<R> {
    /// Load keys, validate permission configuration and run provider
    /// discovery. Any failure here is fatal for startup.
    pub async fn new(config: &AuthConfig, repo: Arc<R>) -> Result<Self, AuthError> {
        let keys = Arc::new(KeyPair::from_pem(
            &config.jwt.private_key_pem,
            config.jwt.public_key_pem.as_deref(),
        )?);
        tracing::info!(bits = keys.bits(), "Signing key loaded");

        let tokens = TokenService::new(Arc::clone(&keys), &config.jwt)?;
        let state = StateCipher::new(keys, config.state_ttl);
        let catalog = PermissionCatalog::new(&config.permissions)?;
        let oidc = OidcClient::discover(&config.oidc).await?;

        Ok(Self::from_parts(
            oidc,
            state,
            tokens,
            UserService::new(repo),
            catalog,
        ))
    }

    /// Assemble from pre-built components
    pub fn from_parts(
        oidc: OidcClient,
        state: StateCipher,
        tokens: TokenService,
        users: UserService<R>,
        catalog: PermissionCatalog,
    ) -> Self {
        Self {
            oidc,
            state,
            tokens,
            users,
            catalog,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn users(&self) -> &UserService<R> {
        &self.users
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn oidc(&self) -> &OidcClient {
        &self.oidc
    }

    /// Start a login: seal a fresh state and return the provider URL.
    pub fn login(&self, provider: Option<&str>) -> Result<Url, AuthError> {
        if let Some(provider) = provider {
            tracing::debug!(provider, "Login requested");
        }
        let state = self.state.seal()?;
        Ok(self.oidc.authorization_url(&state))
    }

    /// Finish a login and issue a token for the user.
    ///
    /// Performs at most one store write. Nothing is retried.
    #[tracing::instrument(skip_all, fields(provider = params.provider.as_deref().unwrap_or("default")))]
    pub async fn callback(&self, params: &CallbackParams) -> Result<SignedToken, AuthError> {
        let result = self.run_callback(params).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) if e.is_client_error() => "rejected",
            Err(_) => "error",
        };
        metrics::counter!("warden_oidc_callbacks_total", "outcome" => outcome).increment(1);
        result
    }

    async fn run_callback(&self, params: &CallbackParams) -> Result<SignedToken, AuthError> {
        let provider_error = non_blank(params.error.as_deref());
        let provider_error_description = non_blank(params.error_description.as_deref());
        if provider_error.is_some() || provider_error_description.is_some() {
            tracing::warn!(
                error = provider_error.unwrap_or_default(),
                description = provider_error_description.unwrap_or_default(),
                "Identity provider returned an error"
            );
            return Err(AuthError::Unauthorized);
        }

        let (Some(state), Some(code)) = (
            non_blank(params.state.as_deref()),
            non_blank(params.code.as_deref()),
        ) else {
            tracing::warn!("Callback missing state or code");
            return Err(AuthError::Unauthorized);
        };

        self.state.open(state)?;

        let provider_tokens = self.oidc.exchange_code(code).await?;
        let profile = self.oidc.userinfo(&provider_tokens.access_token).await?;

        let mut user = match self.users.find(&profile.sub).await? {
            Some(existing) if existing.deleted => {
                tracing::warn!(subject = %existing.claims.sub, "Deleted user attempted login");
                return Err(AuthError::Unauthorized);
            }
            Some(existing) => existing,
            None => {
                tracing::info!(subject = %profile.sub, "First login, creating user");
                User::new(profile.sub.clone())
            }
        };

        user.claims = profile;
        if user.permissions.is_empty() {
            user.set_permissions(self.catalog.defaults());
        }

        let user = self.users.save(user).await?;
        self.tokens.create_and_sign(&user)
    }

    /// Issue a fresh token for an existing user
    pub async fn token(&self, subject: &str) -> Result<SignedToken, AuthError> {
        if subject.trim().is_empty() {
            return Err(AuthError::Unauthorized);
        }
        let user = self
            .users
            .find(subject)
            .await?
            .ok_or_else(|| AuthError::NotFound("user".to_string()))?;
        if user.deleted {
            return Err(AuthError::Unauthorized);
        }
        self.tokens.create_and_sign(&user)
    }
}

impl<R: UserRepository + ?Sized> std::fmt::Debug for AuthService<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("oidc", &self.oidc)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
