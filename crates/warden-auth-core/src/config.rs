//! Configuration types for the auth core

use std::time::Duration;

/// Default token lifetime (24 hours)
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::from_secs(1440 * 60);
/// Default lifetime of an unanswered login redirect
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// RSA private key, PKCS#8 or PKCS#1 PEM
    pub private_key_pem: String,
    /// RSA public key PEM; derived from the private key when absent
    pub public_key_pem: Option<String>,
    /// Token lifetime
    pub duration: Duration,
    /// `aud` claim
    pub audience: String,
    /// `iss` claim
    pub issuer: String,
}

impl JwtConfig {
    /// Create a config with default lifetime, audience and issuer
    pub fn new(private_key_pem: impl Into<String>) -> Self {
        Self {
            private_key_pem: private_key_pem.into(),
            public_key_pem: None,
            duration: DEFAULT_TOKEN_DURATION,
            audience: "warden users".to_string(),
            issuer: "warden server".to_string(),
        }
    }

    /// Set an explicit public key
    pub fn with_public_key(mut self, public_key_pem: impl Into<String>) -> Self {
        self.public_key_pem = Some(public_key_pem.into());
        self
    }

    /// Set the token lifetime
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the token lifetime in whole minutes
    pub fn with_duration_minutes(self, minutes: u64) -> Self {
        self.with_duration(Duration::from_secs(minutes * 60))
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("duration", &self.duration)
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("public_key_pem", &self.public_key_pem.is_some())
            .finish_non_exhaustive()
    }
}

/// Credential cookie attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    /// Omitted from `Set-Cookie` when `None`
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    /// `SameSite` attribute value
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "warden".to_string(),
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: true,
            same_site: "Lax".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the cookie domain; an empty string clears it
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.domain = if domain.is_empty() { None } else { Some(domain) };
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
}

/// Identity provider client configuration
#[derive(Clone)]
pub struct OidcConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Provider issuer URL; discovery is fetched from below it
    pub endpoint: String,
    /// Where the provider sends the browser back to
    pub redirect_url: String,
    /// Scopes requested at login
    pub scopes: Vec<String>,
    /// Timeout for each provider round-trip
    pub http_timeout: Duration,
}

impl OidcConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        endpoint: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            endpoint: endpoint.into(),
            redirect_url: redirect_url.into(),
            scopes: vec!["openid".into(), "profile".into(), "email".into()],
            http_timeout: Duration::from_secs(10),
        }
    }

    /// Set the per-call timeout for provider requests
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// URL of the provider discovery document
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/.well-known/openid-configuration",
            self.endpoint.trim_end_matches('/')
        )
    }
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("client_id", &self.client_id)
            .field("endpoint", &self.endpoint)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Permission scopes granted to new users and offered by the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionsConfig {
    /// Granted to a user whose permission set is empty at login
    pub default: Vec<String>,
    /// Added to the built-in catalog
    pub custom: Vec<String>,
}

/// Auth core configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub oidc: OidcConfig,
    pub permissions: PermissionsConfig,
    /// Maximum age of an auth state returned at callback
    pub state_ttl: Duration,
}

impl AuthConfig {
    /// Create a new auth config with default cookie and permission settings
    pub fn new(jwt: JwtConfig, oidc: OidcConfig) -> Self {
        Self {
            jwt,
            cookie: CookieConfig::default(),
            oidc,
            permissions: PermissionsConfig::default(),
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_permissions(mut self, permissions: PermissionsConfig) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }
}
