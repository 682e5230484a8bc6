//! Mock OIDC provider for integration testing
//!
//! Serves discovery, token and userinfo endpoints through wiremock.

use std::time::Duration;

use warden_auth_core::testing::PRIMARY_PRIVATE_KEY;
use warden_auth_core::{AuthConfig, JwtConfig, OidcConfig, PermissionsConfig};
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockGuard, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "warden-test-client";
pub const CLIENT_SECRET: &str = "warden-test-secret";
pub const REDIRECT_URL: &str = "http://localhost:8080/auth/callback";

/// Auth config pointing at a mock provider, with the fixture signing key
pub fn auth_config(provider_url: &str) -> AuthConfig {
    let jwt = JwtConfig::new(PRIMARY_PRIVATE_KEY).with_duration_minutes(60);
    let oidc = OidcConfig::new(CLIENT_ID, CLIENT_SECRET, provider_url, REDIRECT_URL)
        .with_http_timeout(Duration::from_secs(5));
    AuthConfig::new(jwt, oidc).with_permissions(PermissionsConfig {
        default: vec!["users:list:*".into(), "token:get:*".into()],
        custom: vec![],
    })
}

/// Mock identity provider
pub struct OidcMockServer {
    server: MockServer,
}

impl OidcMockServer {
    /// Start a provider with a discovery document mounted
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let uri = server.uri();
        Self::mount_discovery(&server, &uri).await;
        Self { server }
    }

    /// Start a provider whose discovery document claims another issuer
    #[allow(dead_code)]
    pub async fn start_with_issuer(issuer: &str) -> Self {
        let server = MockServer::start().await;
        Self::mount_discovery(&server, issuer).await;
        Self { server }
    }

    /// Start a bare mock server without discovery mounted
    #[allow(dead_code)]
    pub async fn start_bare() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    async fn mount_discovery(server: &MockServer, issuer: &str) {
        let uri = server.uri();
        let document = serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{uri}/authorize"),
            "token_endpoint": format!("{uri}/token"),
            "userinfo_endpoint": format!("{uri}/userinfo"),
            "jwks_uri": format!("{uri}/jwks"),
        });
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(server)
            .await;
    }

    /// Base URL of the provider (its issuer)
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Accept `code` and answer userinfo for the resulting access token
    pub async fn expect_login(&self, code: &str, profile: serde_json::Value) {
        let access_token = format!("at-{code}");
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(basic_auth(CLIENT_ID, CLIENT_SECRET))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains(format!("code={code}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "token_type": "Bearer",
                "expires_in": 3600,
            })))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&self.server)
            .await;
    }

    /// Token endpoint answers every exchange with `status`
    #[allow(dead_code)]
    pub async fn token_endpoint_fails(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&self.server)
            .await;
    }

    /// Token endpoint succeeds but userinfo answers with `status`
    #[allow(dead_code)]
    pub async fn userinfo_fails(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at-any",
                "token_type": "Bearer",
            })))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Assert the token endpoint is never called while the guard lives
    #[allow(dead_code)]
    pub async fn expect_no_exchange(&self) -> MockGuard {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount_as_scoped(&self.server)
            .await
    }
}

/// Pull the `state` query parameter out of a login redirect
#[allow(dead_code)]
pub fn state_from(url: &url::Url) -> String {
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("login url carries state")
}
