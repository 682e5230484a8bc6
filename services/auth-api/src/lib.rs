//! Warden Auth API
//!
//! Composition root wiring the Warden auth core into HTTP routes.
//!
//! ## Browser Endpoints
//!
//! - `GET /auth/login` - Redirect to the identity provider
//! - `GET /auth/callback` - Finish login, set the credential cookie
//! - `GET /auth/logout` - Clear the credential cookie
//!
//! ## API Endpoints
//!
//! All behind the cancelling auth gate.
//!
//! - `GET /api/me` - Current identity
//! - `GET /api/auth/token` - Fresh bearer token (`token:get:*`)
//! - `GET /api/permissions` - Permission catalog (`permissions:list:*`)
//! - `POST /api/users` - Create user (`users:create:*`)
//! - `GET /api/users` - List users (`users:list:*`)
//! - `GET /api/users/{id}` - Get user (`users:get:id`)
//! - `PUT /api/users/{id}` - Update user (`users:update:id`)
//! - `DELETE /api/users/{id}` - Soft delete user (`users:delete:id`)
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use warden_auth_core::PermissionError;
use warden_axum::{AuthGateLayer, GateConfig, RequirePermissions};

pub use crate::config::{Config, ConfigError, LogFormat, RedirectConfig};
pub use crate::state::{AppState, AuthServiceImpl};

/// Build the HTTP router.
///
/// # Errors
/// Fails if a route's required permissions are malformed.
pub fn build_router(
    state: AppState,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<Router, PermissionError> {
    let request_timeout = state.request_timeout();
    let gate = |config: GateConfig| {
        AuthGateLayer::new(
            state.auth.tokens().clone(),
            state.auth.users().clone(),
            config,
        )
    };
    let api_gate = gate(GateConfig::cancelling(state.cookie().clone()));
    let site_gate = gate(GateConfig::non_cancelling(state.cookie().clone()));

    // API routes, each guarded by its scope
    let api = Router::new()
        .route("/me", get(handlers::me))
        .route(
            "/auth/token",
            get(handlers::token).route_layer(RequirePermissions::any(["token:get:*"])?),
        )
        .route(
            "/permissions",
            get(handlers::list_permissions)
                .route_layer(RequirePermissions::any(["permissions:list:*"])?),
        )
        .route(
            "/users",
            post(handlers::create_user)
                .route_layer(RequirePermissions::any(["users:create:*"])?)
                .merge(
                    get(handlers::list_users)
                        .route_layer(RequirePermissions::any(["users:list:*"])?),
                ),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .route_layer(RequirePermissions::any(["users:get:id"])?)
                .merge(
                    put(handlers::update_user)
                        .route_layer(RequirePermissions::any(["users:update:id"])?),
                )
                .merge(
                    delete(handlers::delete_user)
                        .route_layer(RequirePermissions::any(["users:delete:id"])?),
                ),
        )
        .layer(api_gate);

    // Browser login flow
    let browser = Router::new()
        .route("/auth/login", get(handlers::login))
        .route("/auth/callback", get(handlers::callback))
        .route("/auth/logout", get(handlers::logout));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    // Every non-health route sees the non-cancelling gate, so public pages
    // can branch on identity; /api/* additionally requires it. Cookies set
    // by the login, callback and logout handlers take precedence over the
    // gate's renewal or clearing cookie.
    Ok(Router::new()
        .nest("/api", api)
        .merge(browser)
        .layer(site_gate)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state))
}
