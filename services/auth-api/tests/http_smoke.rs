//! End-to-end tests through the full router
//!
//! Each test runs the real middleware stack, auth gates and handlers
//! against the in-memory store and a wiremock identity provider.

mod common;

use axum::http::StatusCode;
use common::{cookie_cleared, cookie_token, json_body, location, set_cookies, TestApp};

fn state_param(login_location: &str) -> String {
    let url = url::Url::parse(login_location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

async fn log_in(app: &TestApp, code: &str) -> String {
    let response = app.get("/auth/login", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let state = state_param(&location(&response));

    let response = app
        .get(&format!("/auth/callback?state={state}&code={code}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
    cookie_token(&response).expect("login sets the credential cookie")
}

#[tokio::test]
async fn test_first_login_end_to_end() {
    let app = TestApp::start().await;
    app.provider_accepts(
        "code-alice",
        serde_json::json!({ "sub": "alice", "email": "alice@example.com" }),
    )
    .await;

    let token = log_in(&app, "code-alice").await;

    // Default permissions include users:list:*
    let response = app.get("/api/users", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users = json_body(response).await;
    assert_eq!(users[0]["claims"]["sub"], "alice");
    assert_eq!(
        users[0]["permissions"],
        serde_json::json!(["users:list:*", "token:get:*"])
    );

    // No credential
    let response = app.get("/api/users", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");

    // Lacking permissions:list:*
    let response = app.get("/api/permissions", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await["error"]["details"]["required"],
        serde_json::json!(["permissions:list:*"])
    );
}

#[tokio::test]
async fn test_login_redirect_targets_provider() {
    let app = TestApp::start().await;
    let response = app.get("/auth/login", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let target = location(&response);
    assert!(target.starts_with(&format!("{}/authorize?", app.provider.uri())));
    assert!(target.contains("client_id=warden-app"));
    assert!(target.contains("response_type=code"));
}

#[tokio::test]
async fn test_bad_callback_redirects_to_unauthorized_page() {
    let app = TestApp::start().await;
    let response = app
        .get("/auth/callback?state=forged&code=anything", None)
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/error/401");
    assert!(cookie_cleared(&response));
    assert!(app.repo.is_empty());

    let response = app
        .get("/auth/callback?error=access_denied", None)
        .await;
    assert_eq!(location(&response), "/error/401");
}

#[tokio::test]
async fn test_provider_failure_redirects_to_error_page() {
    let app = TestApp::start().await;
    let response = app.get("/auth/login", None).await;
    let state = state_param(&location(&response));

    // No token endpoint mounted: wiremock answers 404, which is a rejected code.
    let response = app
        .get(&format!("/auth/callback?state={state}&code=x"), None)
        .await;
    assert_eq!(location(&response), "/error/401");

    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .and(wiremock::matchers::path("/token"))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&app.provider)
        .await;
    let response = app
        .get(&format!("/auth/callback?state={state}&code=x"), None)
        .await;
    assert_eq!(location(&response), "/error/500");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::start().await;
    let response = app.get("/auth/logout", None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
    assert!(cookie_cleared(&response));
}

#[tokio::test]
async fn test_logout_with_renewable_token_stays_logged_out() {
    let app = TestApp::start().await;
    // 40 minutes into a 60 minute token: past the renewal point
    let token = app.seed_user_aged("alice", &["users:list:*"], 40);

    let response = app.get("/auth/logout", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1, "{cookies:?}");
    assert!(cookies[0].starts_with("warden=; Path=/; Max-Age=0"));
    assert_eq!(cookie_token(&response), None);
}

#[tokio::test]
async fn test_callback_replaces_stale_cookie() {
    let app = TestApp::start().await;
    app.provider_accepts("code-bob", serde_json::json!({ "sub": "bob" }))
        .await;

    let response = app.get("/auth/login", None).await;
    let state = state_param(&location(&response));

    let response = app
        .get(
            &format!("/auth/callback?state={state}&code=code-bob"),
            Some("stale.bad.token"),
        )
        .await;
    assert_eq!(location(&response), "/");

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1, "{cookies:?}");
    let token = cookie_token(&response).expect("login sets the credential cookie");
    assert!(cookies[0].starts_with(&format!("warden={token};")));
    assert!(!cookie_cleared(&response));

    let response = app.get("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_and_token() {
    let app = TestApp::start().await;
    let token = app.seed_user("alice", &["token:get:*", "users:list:*"]);

    let response = app.get("/api/me", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = json_body(response).await;
    assert_eq!(me["user"]["claims"]["sub"], "alice");
    assert_eq!(me["source"], "cookie");

    let response = app.get("/api/auth/token", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = json_body(response).await;
    let bearer = issued["token"].as_str().unwrap().to_string();
    assert!(issued["expiry"].is_string());

    let request = axum::http::Request::builder()
        .uri("/api/users")
        .header("authorization", format!("Bearer {bearer}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_management() {
    let app = TestApp::start().await;
    let admin = app.seed_user("admin", &["users:*:*", "permissions:list:*"]);

    let bob = serde_json::json!({
        "claims": { "sub": "bob", "email": "bob@example.com" },
        "permissions": ["Users:List:*", "users:list:*"]
    });
    let response = app.send_json("POST", "/api/users", &admin, bob.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["permissions"], serde_json::json!(["users:list:*"]));

    let response = app.send_json("POST", "/api/users", &admin, bob).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let invalid = serde_json::json!({
        "claims": { "sub": "carol" },
        "permissions": ["users:list"]
    });
    let response = app.send_json("POST", "/api/users", &admin, invalid).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["permissions[0]"].is_string());

    let response = app.get("/api/users/bob", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["claims"]["email"], "bob@example.com");

    let response = app
        .send_json(
            "PUT",
            "/api/users/bob",
            &admin,
            serde_json::json!({ "claims": { "sub": "mallory" } }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/users/nobody", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/permissions", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let catalog = json_body(response).await;
    assert!(catalog
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("reports:read:*")));
}

#[tokio::test]
async fn test_deleted_user_loses_access() {
    let app = TestApp::start().await;
    let admin = app.seed_user("admin", &["users:*:*"]);
    let bob = app.seed_user("bob", &["users:list:*"]);

    let response = app
        .send(common::request("DELETE", "/api/users/bob", Some(&admin), None))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/users", Some(&bob)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(cookie_cleared(&response));
}

#[tokio::test]
async fn test_path_scoped_permission() {
    let app = TestApp::start().await;
    let carol = app.seed_user("carol", &["users:get:carol"]);
    app.seed_user("dave", &[]);

    let response = app.get("/api/users/carol", Some(&carol)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/users/dave", Some(&carol)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(common::request("DELETE", "/api/users/carol", Some(&carol), None))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::start().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");

    let response = app.get("/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    app.repo.set_unavailable(true);
    let response = app.get("/ready", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        json_body(response).await["checks"]["user_store"]["status"],
        "error"
    );
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::start().await;
    let response = app.get("/api/me", None).await;
    assert!(response.headers().contains_key("x-request-id"));
}
