//! Per-route permission guards.
//!
//! Apply with `route_layer` so the route's path parameters are available:
//! a required `users:get:id` on `/users/{id}` is checked as
//! `users:get:<id>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};
use warden_auth_core::permission::normalize_scopes;
use warden_auth_core::{MatchMode, PermissionError};

use crate::context::Authentication;
use crate::error::GateError;

/// Layer requiring the authenticated user to hold some or all of a set of
/// scopes.
#[derive(Debug, Clone)]
pub struct RequirePermissions {
    required: Arc<[String]>,
    mode: MatchMode,
}

impl RequirePermissions {
    /// Pass if any required scope is held.
    ///
    /// # Errors
    /// Returns an error if the list is empty or any scope is malformed.
    pub fn any<I, S>(scopes: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(MatchMode::Any, scopes)
    }

    /// Pass only if every required scope is held.
    ///
    /// # Errors
    /// Returns an error if the list is empty or any scope is malformed.
    pub fn all<I, S>(scopes: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(MatchMode::All, scopes)
    }

    pub fn new<I, S>(mode: MatchMode, scopes: I) -> Result<Self, PermissionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let required = normalize_scopes(scopes)?;
        if required.is_empty() {
            return Err(PermissionError::NoneRequired);
        }
        Ok(Self {
            required: required.into(),
            mode,
        })
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Decide for one request
    pub fn check(
        &self,
        auth: Option<&Authentication>,
        params: &[(String, String)],
    ) -> Result<(), GateError> {
        let ctx = auth
            .and_then(Authentication::context)
            .ok_or(GateError::Unauthenticated)?;
        if self.mode.evaluate(ctx.permissions(), &self.required[..], params) {
            Ok(())
        } else {
            Err(GateError::forbidden(&self.required))
        }
    }
}

impl<S> Layer<S> for RequirePermissions {
    type Service = PermissionGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PermissionGuard {
            inner,
            requirement: self.clone(),
        }
    }
}

/// Service produced by [`RequirePermissions`].
#[derive(Debug, Clone)]
pub struct PermissionGuard<S> {
    inner: S,
    requirement: RequirePermissions,
}

impl<S> Service<Request<Body>> for PermissionGuard<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let requirement = self.requirement.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            // Required scopes are lower-cased, so parameter names are too.
            let params: Vec<(String, String)> =
                match RawPathParams::from_request_parts(&mut parts, &()).await {
                    Ok(raw) => raw
                        .iter()
                        .map(|(name, value)| (name.to_lowercase(), value.to_string()))
                        .collect(),
                    Err(_) => Vec::new(),
                };

            if let Err(e) = requirement.check(parts.extensions.get::<Authentication>(), &params) {
                let reason = match e {
                    GateError::Forbidden { .. } => "forbidden",
                    _ => "unauthenticated",
                };
                metrics::counter!("warden_auth_rejections_total", "reason" => reason).increment(1);
                tracing::warn!(
                    path = %parts.uri.path(),
                    required = ?requirement.required(),
                    reason,
                    "Permission check failed"
                );
                return Ok(e.into_response());
            }

            inner.call(Request::from_parts(parts, body)).await
        })
    }
}
