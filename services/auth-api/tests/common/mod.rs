//! Common test utilities for auth-api integration tests

use std::sync::Arc;

use auth_api::{build_router, AppState, AuthServiceImpl, Config};
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeDelta, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;
use warden_auth_core::testing::PRIMARY_PRIVATE_KEY;
use warden_db::{InMemoryUserRepository, UserRepository};
use warden_types::User;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Running service wired to a mock identity provider
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: InMemoryUserRepository,
    pub provider: MockServer,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn start() -> Self {
        let provider = MockServer::start().await;
        let uri = provider.uri();
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issuer": uri,
                "authorization_endpoint": format!("{uri}/authorize"),
                "token_endpoint": format!("{uri}/token"),
                "userinfo_endpoint": format!("{uri}/userinfo"),
                "jwks_uri": format!("{uri}/jwks"),
            })))
            .mount(&provider)
            .await;

        let vars = [
            ("JWT_PRIVATE_KEY", PRIMARY_PRIVATE_KEY.to_string()),
            ("JWT_DURATION_MINUTES", "60".to_string()),
            ("OIDC_CLIENT_ID", "warden-app".to_string()),
            ("OIDC_CLIENT_SECRET", "secret".to_string()),
            ("OIDC_ENDPOINT", uri.clone()),
            (
                "OIDC_REDIRECT_URL",
                "http://localhost:8080/auth/callback".to_string(),
            ),
            ("PERMISSIONS_DEFAULT", "users:list:*,token:get:*".to_string()),
            ("PERMISSIONS_CUSTOM", "reports:read:*".to_string()),
        ];
        let config = Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("test config is complete");

        let repo = InMemoryUserRepository::new();
        let store: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let auth = AuthServiceImpl::new(&config.auth, store)
            .await
            .expect("service starts against the mock provider");

        let state = AppState::new(auth, config);
        let router = build_router(state.clone(), None).expect("route scopes are valid");

        Self {
            router,
            state,
            repo,
            provider,
        }
    }

    /// Make the provider accept `code` for a user with this profile
    pub async fn provider_accepts(&self, code: &str, profile: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(format!("code={code}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": format!("at-{code}"),
                "token_type": "Bearer",
            })))
            .mount(&self.provider)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(wiremock::matchers::header(
                "authorization",
                format!("Bearer at-{code}").as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&self.provider)
            .await;
    }

    /// Store a user and return a token for them
    pub fn seed_user(&self, subject: &str, permissions: &[&str]) -> String {
        self.seed_user_aged(subject, permissions, 0)
    }

    /// Store a user and return a token issued `minutes` ago
    pub fn seed_user_aged(&self, subject: &str, permissions: &[&str], minutes: i64) -> String {
        let user = User::new(subject).with_permissions(permissions.iter().copied());
        self.repo.insert_user(user.clone());
        self.state
            .auth
            .tokens()
            .create_and_sign_at(&user, Utc::now() - TimeDelta::minutes(minutes))
            .expect("signing succeeds")
            .token
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Response {
        self.send(request(method, uri, Some(token), Some(body))).await
    }
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("warden={token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect has a location")
        .to_str()
        .unwrap()
        .to_string()
}

/// Token carried by the response's credential cookie, if one was set
#[allow(dead_code)]
pub fn cookie_token(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix("warden="))
        .filter_map(|v| v.split(';').next())
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

#[allow(dead_code)]
pub fn cookie_cleared(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("warden=;") && v.contains("Max-Age=0"))
}

/// Every `Set-Cookie` value in header order
#[allow(dead_code)]
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
