//! Common test utilities for warden-axum integration tests

use axum::body::Body;
use axum::http::{header, Request};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, TimeDelta, Utc};
use warden_auth_core::testing::{fixture_keys, PRIMARY_PRIVATE_KEY};
use warden_auth_core::{CookieConfig, JwtConfig, TokenService, UserService};
use warden_axum::{AuthGateLayer, GateConfig, MaybeAuth, RequireAuth, RequirePermissions};
use warden_db::InMemoryUserRepository;
use warden_types::User;

pub const TOKEN_MINUTES: u64 = 60;

/// Token service and user store shared by a test
pub struct Harness {
    pub tokens: TokenService,
    pub repo: InMemoryUserRepository,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        let config = JwtConfig::new(PRIMARY_PRIVATE_KEY).with_duration_minutes(TOKEN_MINUTES);
        Self {
            tokens: TokenService::new(fixture_keys(), &config).expect("fixture config is valid"),
            repo: InMemoryUserRepository::new(),
        }
    }

    pub fn users(&self) -> UserService<InMemoryUserRepository> {
        UserService::new(std::sync::Arc::new(self.repo.clone()))
    }

    pub fn add_user(&self, subject: &str, permissions: &[&str]) -> User {
        let user = User::new(subject).with_permissions(permissions.iter().copied());
        self.repo.insert_user(user.clone());
        user
    }

    /// Fresh token for a stored user
    pub fn token_for(&self, subject: &str) -> String {
        self.token_issued_at(subject, Utc::now())
    }

    /// Token issued `minutes` ago
    pub fn token_aged(&self, subject: &str, minutes: i64) -> String {
        self.token_issued_at(subject, Utc::now() - TimeDelta::minutes(minutes))
    }

    pub fn token_issued_at(&self, subject: &str, issued: DateTime<Utc>) -> String {
        let user = User::new(subject);
        self.tokens
            .create_and_sign_at(&user, issued)
            .expect("signing should succeed")
            .token
    }

    pub fn gate(&self, config: GateConfig) -> AuthGateLayer<InMemoryUserRepository> {
        AuthGateLayer::new(self.tokens.clone(), self.users(), config)
    }

    /// Guarded routes behind a single gate
    pub fn router(&self, config: GateConfig) -> Router {
        routes().layer(self.gate(config))
    }

    /// `/public` behind a non-cancelling gate, `/api/*` additionally behind
    /// a cancelling one
    pub fn nested_router(&self) -> Router {
        Router::new()
            .nest(
                "/api",
                routes().layer(self.gate(GateConfig::cancelling(CookieConfig::default()))),
            )
            .route("/public", get(whoami))
            .layer(self.gate(GateConfig::non_cancelling(CookieConfig::default())))
    }
}

fn routes() -> Router {
    Router::new()
        .route(
            "/users",
            get(list_users).route_layer(RequirePermissions::any(["users:list:*"]).unwrap()),
        )
        .route(
            "/users/{id}",
            get(show_user).route_layer(RequirePermissions::any(["users:get:id"]).unwrap()),
        )
        .route("/me", get(me))
        .route("/whoami", get(whoami))
}

async fn list_users() -> &'static str {
    "user list"
}

async fn show_user(auth: RequireAuth) -> String {
    format!("shown to {}", auth.subject)
}

async fn me(auth: RequireAuth) -> String {
    auth.subject.clone()
}

async fn whoami(auth: MaybeAuth) -> String {
    match auth.0 {
        Some(ctx) => ctx.subject,
        None => "guest".to_string(),
    }
}

#[allow(dead_code)]
pub fn cookie_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("warden={token}"))
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn bearer_request(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn anonymous_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// All `Set-Cookie` values on a response
#[allow(dead_code)]
pub fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub async fn body_string(response: axum::response::Response) -> String {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
