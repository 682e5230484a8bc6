//! Tower middleware layer for request authentication.
//!
//! The [`AuthGateLayer`] reads the request's credential, verifies it,
//! renews it when at most half its lifetime remains, loads the user and
//! attaches an [`Authentication`] to the request extensions.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tower::{Layer, Service};
use warden_auth_core::{CookieConfig, TokenService, UserService};
use warden_db::UserRepository;

use crate::context::{AuthContext, Authentication};
use crate::cookie::{clear_cookie, extract_credential, header_value, sets_cookie, token_cookie};
use crate::error::GateError;

/// What the gate does with a request it cannot authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    /// Respond 401 (500 on store or renewal failure) without calling the handler.
    Cancelling,
    /// Attach [`Authentication::Anonymous`] and call the handler.
    NonCancelling,
}

/// Configuration for the auth gate.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub mode: GateMode,
    /// Credential cookie attributes, used for reading and for renewal.
    pub cookie: CookieConfig,
    /// Whether to accept `Authorization: Bearer` when no cookie is sent.
    pub allow_bearer_token: bool,
}

impl GateConfig {
    /// Gate that rejects unauthenticated requests.
    #[must_use]
    pub fn cancelling(cookie: CookieConfig) -> Self {
        Self {
            mode: GateMode::Cancelling,
            cookie,
            allow_bearer_token: true,
        }
    }

    /// Gate that lets unauthenticated requests through as anonymous.
    #[must_use]
    pub fn non_cancelling(cookie: CookieConfig) -> Self {
        Self {
            mode: GateMode::NonCancelling,
            ..Self::cancelling(cookie)
        }
    }

    /// Set the gate mode.
    #[must_use]
    pub fn mode(mut self, mode: GateMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set whether to allow bearer token auth.
    #[must_use]
    pub fn allow_bearer_token(mut self, allow: bool) -> Self {
        self.allow_bearer_token = allow;
        self
    }
}

struct GateInner<R: UserRepository + ?Sized> {
    tokens: TokenService,
    users: UserService<R>,
    config: GateConfig,
}

/// Tower layer that authenticates requests.
pub struct AuthGateLayer<R: UserRepository + ?Sized> {
    gate: Arc<GateInner<R>>,
}

impl<R: UserRepository + ?Sized> Clone for AuthGateLayer<R> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<R: UserRepository + ?Sized> AuthGateLayer<R> {
    #[must_use]
    pub fn new(tokens: TokenService, users: UserService<R>, config: GateConfig) -> Self {
        Self {
            gate: Arc::new(GateInner {
                tokens,
                users,
                config,
            }),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.gate.config
    }
}

impl<S, R: UserRepository + ?Sized> Layer<S> for AuthGateLayer<R> {
    type Service = AuthGate<S, R>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            gate: Arc::clone(&self.gate),
        }
    }
}

/// The auth gate service.
pub struct AuthGate<S, R: UserRepository + ?Sized> {
    inner: S,
    gate: Arc<GateInner<R>>,
}

impl<S: Clone, R: UserRepository + ?Sized> Clone for AuthGate<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, R> Service<Request<Body>> for AuthGate<S, R>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    R: UserRepository + ?Sized + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let gate = Arc::clone(&self.gate);

        Box::pin(async move {
            let mode = gate.config.mode;

            // An outer gate already decided for this request.
            let prior = req
                .extensions()
                .get::<Authentication>()
                .map(Authentication::is_authenticated);
            match prior {
                Some(true) => return inner.call(req).await,
                Some(false) if mode == GateMode::Cancelling => {
                    return Ok(GateError::Unauthenticated.into_response());
                }
                Some(false) => return inner.call(req).await,
                None => {}
            }

            match gate.authenticate(req.headers()).await {
                Ok(admitted) => {
                    req.extensions_mut()
                        .insert(Authentication::Authenticated(admitted.context));
                    let mut response = inner.call(req).await?;
                    if let Some(cookie) = admitted.renewed_cookie {
                        append_cookie(&mut response, &gate.config.cookie.name, &cookie);
                    }
                    Ok(response)
                }
                Err(rejection) => {
                    rejection.record();
                    let cleared = rejection
                        .clears_cookie()
                        .then(|| clear_cookie(&gate.config.cookie));

                    let mut response = match mode {
                        GateMode::Cancelling => rejection.into_error().into_response(),
                        GateMode::NonCancelling => {
                            req.extensions_mut().insert(Authentication::Anonymous);
                            inner.call(req).await?
                        }
                    };
                    if let Some(cookie) = cleared {
                        append_cookie(&mut response, &gate.config.cookie.name, &cookie);
                    }
                    Ok(response)
                }
            }
        })
    }
}

/// An authenticated request, plus the cookie to set if the token was renewed
struct Admitted {
    context: AuthContext,
    renewed_cookie: Option<String>,
}

/// Why a request was not authenticated
#[derive(Debug)]
enum Rejection {
    Missing,
    Invalid,
    UnknownUser,
    Deleted,
    Store(String),
    Renewal(String),
}

impl Rejection {
    fn reason(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Invalid => "invalid",
            Self::UnknownUser => "unknown_user",
            Self::Deleted => "deleted",
            Self::Store(_) => "store",
            Self::Renewal(_) => "renewal",
        }
    }

    fn clears_cookie(&self) -> bool {
        matches!(
            self,
            Self::Invalid | Self::UnknownUser | Self::Deleted | Self::Renewal(_)
        )
    }

    fn record(&self) {
        metrics::counter!("warden_auth_rejections_total", "reason" => self.reason()).increment(1);
        match self {
            Self::Missing => tracing::debug!("No credential on request"),
            Self::Invalid => tracing::debug!("Credential failed verification"),
            Self::UnknownUser | Self::Deleted => {
                tracing::warn!(reason = self.reason(), "Token subject cannot sign in");
            }
            Self::Store(e) => tracing::error!(error = %e, "User lookup failed"),
            Self::Renewal(e) => tracing::error!(error = %e, "Token renewal failed"),
        }
    }

    fn into_error(self) -> GateError {
        match self {
            Self::Store(e) | Self::Renewal(e) => GateError::Internal(e),
            _ => GateError::Unauthenticated,
        }
    }
}

impl<R: UserRepository + ?Sized> GateInner<R> {
    #[tracing::instrument(name = "auth_gate", skip_all)]
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Admitted, Rejection> {
        let (token, source) = extract_credential(
            headers,
            &self.config.cookie.name,
            self.config.allow_bearer_token,
        )
        .ok_or(Rejection::Missing)?;

        let now = Utc::now();
        let claims = self.tokens.verify_at(&token, now).ok_or(Rejection::Invalid)?;

        // Identity first: never renew a token for a user who cannot sign in.
        let user = match self.users.find(&claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(Rejection::UnknownUser),
            Err(e) => return Err(Rejection::Store(e.to_string())),
        };
        if user.deleted {
            return Err(Rejection::Deleted);
        }

        let renewed_cookie = if self.tokens.needs_renewal(&claims, now) {
            match self.tokens.renew_claims_at(&claims, now) {
                Ok(signed) => {
                    metrics::counter!("warden_auth_renewals_total").increment(1);
                    tracing::debug!(subject = %claims.sub, expiry = %signed.expiry, "Token renewed");
                    Some(token_cookie(
                        &self.config.cookie,
                        &signed.token,
                        self.tokens.duration().num_seconds(),
                    ))
                }
                Err(e) => return Err(Rejection::Renewal(e.to_string())),
            }
        } else {
            None
        };

        let context = AuthContext::new(user, claims)
            .with_source(source)
            .with_renewed(renewed_cookie.is_some());
        Ok(Admitted {
            context,
            renewed_cookie,
        })
    }
}

/// Append the gate's cookie unless the handler already set the credential
/// cookie itself; browsers apply the last `Set-Cookie` for a name.
fn append_cookie(response: &mut Response, name: &str, cookie: &str) {
    if sets_cookie(response.headers(), name) {
        return;
    }
    if let Some(value) = header_value(cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}
