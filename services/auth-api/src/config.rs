//! Configuration for the Auth API service.

use std::time::Duration;

use warden_auth_core::{AuthConfig, CookieConfig, JwtConfig, OidcConfig, PermissionsConfig};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` directly, so logging can start before the rest of
    /// the configuration is parsed. Unknown values fall back to text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Where browser flows end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    /// After a successful login
    pub login: String,
    /// After logout
    pub logout: String,
    /// When the login round-trip is rejected
    pub unauthorized: String,
    /// When the provider or the store fails
    pub error: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            login: "/".to_string(),
            logout: "/".to_string(),
            unauthorized: "/error/401".to_string(),
            error: "/error/500".to_string(),
        }
    }
}

/// Auth API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// Browser redirect targets
    pub redirects: RedirectConfig,

    /// Request timeout for API routes
    pub request_timeout: Duration,

    /// Metrics enabled
    pub metrics_enabled: bool,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &'static str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let flag = |key: &'static str, default: bool| match get(key) {
            None => Ok(default),
            Some(v) => v.trim().parse::<bool>().map_err(|_| ConfigError::Invalid(key)),
        };

        // Server
        let http_port = var("HTTP_PORT", "8080")
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = var("METRICS_ENABLED", "true").parse().unwrap_or(true);

        let log_format = match var("LOG_FORMAT", "text").as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            _ => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        // Signing keys; PEMs may arrive with escaped newlines
        let private_key = unescape_pem(&required("JWT_PRIVATE_KEY")?);
        let public_key = get("JWT_PUBLIC_KEY")
            .filter(|v| !v.trim().is_empty())
            .map(|v| unescape_pem(&v));

        let duration_minutes: u64 = var("JWT_DURATION_MINUTES", "1440")
            .parse()
            .map_err(|_| ConfigError::Invalid("JWT_DURATION_MINUTES"))?;
        if duration_minutes == 0 {
            return Err(ConfigError::Invalid("JWT_DURATION_MINUTES"));
        }

        let mut jwt = JwtConfig::new(private_key)
            .with_duration_minutes(duration_minutes)
            .with_audience(var("JWT_AUDIENCE", "warden users"))
            .with_issuer(var("JWT_ISSUER", "warden server"));
        if let Some(public_key) = public_key {
            jwt = jwt.with_public_key(public_key);
        }

        // Cookie
        let cookie = CookieConfig::default()
            .with_name(var("COOKIE_NAME", "warden"))
            .with_path(var("COOKIE_PATH", "/"))
            .with_domain(var("COOKIE_DOMAIN", ""))
            .with_secure(flag("COOKIE_SECURE", true)?)
            .with_http_only(flag("COOKIE_HTTP_ONLY", true)?);

        // Identity provider
        let oidc = OidcConfig::new(
            required("OIDC_CLIENT_ID")?,
            required("OIDC_CLIENT_SECRET")?,
            required("OIDC_ENDPOINT")?,
            required("OIDC_REDIRECT_URL")?,
        );

        let permissions = PermissionsConfig {
            default: split_list(&var("PERMISSIONS_DEFAULT", "")),
            custom: split_list(&var("PERMISSIONS_CUSTOM", "")),
        };

        let state_ttl_secs: u64 = var("AUTH_STATE_TTL_SECS", "600")
            .parse()
            .map_err(|_| ConfigError::Invalid("AUTH_STATE_TTL_SECS"))?;

        let auth = AuthConfig::new(jwt, oidc)
            .with_cookie(cookie)
            .with_permissions(permissions)
            .with_state_ttl(Duration::from_secs(state_ttl_secs));

        let redirects = RedirectConfig {
            login: var("REDIRECT_LOGIN", "/"),
            logout: var("REDIRECT_LOGOUT", "/"),
            unauthorized: var("REDIRECT_UNAUTHORIZED", "/error/401"),
            error: var("REDIRECT_ERROR", "/error/500"),
        };

        Ok(Self {
            http_port,
            auth,
            redirects,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
            log_format,
        })
    }
}

fn unescape_pem(value: &str) -> String {
    value.replace("\\n", "\n")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
