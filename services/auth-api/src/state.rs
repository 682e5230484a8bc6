//! Application state

use std::sync::Arc;

use warden_auth_core::{AuthService, CookieConfig};
use warden_db::UserRepository;

use crate::config::Config;

/// Auth service over whichever user store the binary wires in
pub type AuthServiceImpl = AuthService<dyn UserRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Login, token and user operations
    pub auth: Arc<AuthServiceImpl>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(auth: AuthServiceImpl, config: Config) -> Self {
        Self {
            auth: Arc::new(auth),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }

    pub fn cookie(&self) -> &CookieConfig {
        &self.config.auth.cookie
    }

    /// `Max-Age` for the credential cookie, equal to the token lifetime
    pub fn cookie_max_age(&self) -> i64 {
        self.auth.tokens().duration().num_seconds()
    }
}
