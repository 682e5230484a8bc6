//! OpenID Connect provider client
//!
//! Discovery runs once at construction. Each login then needs two provider
//! calls: the authorization-code exchange and the userinfo fetch. Neither is
//! retried; dropping the calling future cancels the request in flight.

use std::time::Duration;

use serde::Deserialize;
use url::Url;
use warden_types::StandardClaims;

use crate::config::OidcConfig;
use crate::error::AuthError;

/// Subset of the provider discovery document that we use
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    #[serde(default)]
    pub jwks_uri: Option<String>,
}

/// Token endpoint response
#[derive(Clone, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Client for a single identity provider
#[derive(Clone)]
pub struct OidcClient {
    http: reqwest::Client,
    metadata: ProviderMetadata,
    authorization_endpoint: Url,
    client_id: String,
    client_secret: String,
    redirect_url: Url,
    scopes: Vec<String>,
}

impl OidcClient {
    /// Fetch the discovery document and build a client.
    ///
    /// The HTTP client is configured to fail fast: provider calls sit on the
    /// login path of a browser waiting for a redirect.
    pub async fn discover(config: &OidcConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.http_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| AuthError::Configuration(format!("http client: {e}")))?;
        Self::discover_with_client(config, http).await
    }

    /// Discover using a caller-supplied HTTP client
    pub async fn discover_with_client(
        config: &OidcConfig,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let url = config.discovery_url();
        tracing::info!(url = %url, "Fetching OIDC discovery document");

        let response = http.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "OIDC discovery request failed");
            AuthError::Configuration(format!("discovery request failed: {e}"))
        })?;
        if !response.status().is_success() {
            return Err(AuthError::Configuration(format!(
                "discovery returned status {}",
                response.status()
            )));
        }
        let metadata: ProviderMetadata = response.json().await.map_err(|e| {
            AuthError::Configuration(format!("discovery document is malformed: {e}"))
        })?;

        if metadata.issuer.trim_end_matches('/') != config.endpoint.trim_end_matches('/') {
            return Err(AuthError::Configuration(format!(
                "issuer mismatch: expected {}, provider reports {}",
                config.endpoint, metadata.issuer
            )));
        }

        Self::from_metadata(config, metadata, http)
    }

    /// Build a client from already-known metadata
    pub fn from_metadata(
        config: &OidcConfig,
        metadata: ProviderMetadata,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let authorization_endpoint = Url::parse(&metadata.authorization_endpoint)
            .map_err(|e| AuthError::Configuration(format!("authorization endpoint: {e}")))?;
        let redirect_url = Url::parse(&config.redirect_url)
            .map_err(|e| AuthError::Configuration(format!("redirect url: {e}")))?;

        Ok(Self {
            http,
            metadata,
            authorization_endpoint,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url,
            scopes: config.scopes.clone(),
        })
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// Provider URL the browser is sent to, carrying `state`
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url
    }

    /// Exchange an authorization code for provider tokens.
    ///
    /// A 4xx from the provider means the code was rejected and maps to
    /// `Unauthorized`; anything else unexpected is a `Provider` error.
    #[tracing::instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_url.as_str()),
        ];
        let response = self
            .http
            .post(&self.metadata.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Token exchange request failed");
                AuthError::Provider("token exchange failed".to_string())
            })?;

        let status = response.status();
        if status.is_client_error() {
            tracing::warn!(status = %status, "Provider rejected authorization code");
            return Err(AuthError::Unauthorized);
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Token exchange returned an error");
            return Err(AuthError::Provider(format!("token endpoint returned {status}")));
        }

        response.json::<ProviderTokens>().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse token response");
            AuthError::Provider("malformed token response".to_string())
        })
    }

    /// Fetch the user's profile with a provider access token
    #[tracing::instrument(skip_all)]
    pub async fn userinfo(&self, access_token: &str) -> Result<StandardClaims, AuthError> {
        let response = self
            .http
            .get(&self.metadata.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Userinfo request failed");
                AuthError::Provider("userinfo request failed".to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::warn!(status = %status, "Provider rejected access token");
            return Err(AuthError::Unauthorized);
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Userinfo returned an error");
            return Err(AuthError::Provider(format!("userinfo endpoint returned {status}")));
        }

        let claims: StandardClaims = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse userinfo response");
            AuthError::Provider("malformed userinfo response".to_string())
        })?;
        if claims.sub.trim().is_empty() {
            return Err(AuthError::Provider("userinfo response has no subject".to_string()));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for OidcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcClient")
            .field("issuer", &self.metadata.issuer)
            .field("client_id", &self.client_id)
            .field("redirect_url", &self.redirect_url.as_str())
            .finish_non_exhaustive()
    }
}
