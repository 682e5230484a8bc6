//! Browser login flow and identity endpoints

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use warden_auth_core::{AuthError, CallbackParams};
use warden_axum::cookie::{clear_cookie, token_cookie};
use warden_axum::RequireAuth;
use warden_types::{SignedToken, User};

use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub source: &'static str,
    pub expires_at: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/login
///
/// Redirect the browser to the identity provider
pub async fn login(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Redirect {
    match state.auth.login(query.provider.as_deref()) {
        Ok(url) => Redirect::temporary(url.as_str()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to start login");
            Redirect::temporary(&state.config.redirects.error)
        }
    }
}

/// GET /auth/callback
///
/// Finish the login, set the credential cookie and redirect
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let redirects = &state.config.redirects;
    match state.auth.callback(&params).await {
        Ok(signed) => {
            let cookie = token_cookie(state.cookie(), &signed.token, state.cookie_max_age());
            (
                AppendHeaders([(SET_COOKIE, cookie)]),
                Redirect::temporary(&redirects.login),
            )
                .into_response()
        }
        Err(AuthError::Unauthorized) => (
            AppendHeaders([(SET_COOKIE, clear_cookie(state.cookie()))]),
            Redirect::temporary(&redirects.unauthorized),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Login callback failed");
            Redirect::temporary(&redirects.error).into_response()
        }
    }
}

/// GET /auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, clear_cookie(state.cookie()))]),
        Redirect::temporary(&state.config.redirects.logout),
    )
}

/// GET /api/me
pub async fn me(auth: RequireAuth) -> Json<MeResponse> {
    let auth = auth.0;
    Json(MeResponse {
        source: auth.source.as_str(),
        expires_at: auth.claims.exp,
        user: auth.user,
    })
}

/// GET /api/auth/token
///
/// Issue a fresh token for the caller, for use as a bearer credential
pub async fn token(State(state): State<AppState>, auth: RequireAuth) -> ApiResult<Json<SignedToken>> {
    let signed = state.auth.token(&auth.subject).await?;
    Ok(Json(signed))
}
