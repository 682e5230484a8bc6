//! Warden Axum Integration
//!
//! Axum middleware and extractors that put the Warden auth core in front
//! of an HTTP API.
//!
//! # Overview
//!
//! - **Gate**: [`AuthGateLayer`] reads the credential cookie or bearer
//!   header, verifies and renews the token, loads the user and attaches an
//!   [`Authentication`] to the request
//! - **Guards**: [`RequirePermissions`] checks the attached identity
//!   against a route's required scopes
//! - **Extractors**: [`RequireAuth`], [`MaybeAuth`]
//!
//! # Quick Start
//!
//! ```ignore
//! use warden_axum::{AuthGateLayer, GateConfig, RequireAuth, RequirePermissions};
//! use axum::{Router, routing::get};
//!
//! async fn list_users(auth: RequireAuth) -> String {
//!     format!("Hello, {}!", auth.subject)
//! }
//!
//! let app = Router::new()
//!     .route(
//!         "/api/users",
//!         get(list_users).route_layer(RequirePermissions::any(["users:list:*"])?),
//!     )
//!     .layer(AuthGateLayer::new(tokens, users, GateConfig::cancelling(cookie)));
//! ```

pub mod context;
pub mod cookie;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod layer;

// Re-export primary types
pub use context::{AuthContext, AuthSource, Authentication};
pub use error::{ErrorDetail, ErrorResponse, GateError};
pub use extractors::{MaybeAuth, RequireAuth};
pub use guard::{PermissionGuard, RequirePermissions};
pub use layer::{AuthGate, AuthGateLayer, GateConfig, GateMode};
