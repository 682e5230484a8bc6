//! Permission scopes and matching
//!
//! A scope is `resource:action:target`. A held scope may use `*` in any
//! segment. When the last segment of a required scope names a path
//! parameter of the current request, the parameter's value is compared
//! instead, so `users:get:id` on `/users/{id}` requires `users:get:<id>`.

use std::collections::HashMap;

use thiserror::Error;
use warden_types::FieldErrors;

/// Number of segments in a scope
pub const SEGMENTS: usize = 3;
/// Matches any value in a held scope segment
pub const WILDCARD: &str = "*";

/// Scope validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("permission {scope:?} must have exactly 3 colon-separated parts, found {found}")]
    WrongSegmentCount { scope: String, found: usize },

    #[error("permission {scope:?} has an empty part")]
    EmptySegment { scope: String },

    #[error("at least one required permission must be given")]
    NoneRequired,
}

/// Check the shape of a single scope
pub fn validate_scope(scope: &str) -> Result<(), PermissionError> {
    let parts: Vec<&str> = scope.split(':').collect();
    if parts.len() != SEGMENTS {
        return Err(PermissionError::WrongSegmentCount {
            scope: scope.to_string(),
            found: parts.len(),
        });
    }
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(PermissionError::EmptySegment {
            scope: scope.to_string(),
        });
    }
    Ok(())
}

/// Validate every scope and return them lower-cased
pub fn normalize_scopes<I, S>(scopes: I) -> Result<Vec<String>, PermissionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    scopes
        .into_iter()
        .map(|s| {
            let scope = s.as_ref().trim().to_lowercase();
            validate_scope(&scope).map(|()| scope)
        })
        .collect()
}

/// Validate a user-supplied permission list, reporting each bad entry
/// under `field[i]`.
pub fn validate_permission_list<S: AsRef<str>>(field: &str, scopes: &[S]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    for (i, scope) in scopes.iter().enumerate() {
        if let Err(e) = validate_scope(scope.as_ref()) {
            errors.add(format!("{field}[{i}]"), e.to_string());
        }
    }
    errors.into_result()
}

/// Source of path parameter values for the current request
pub trait PathParams {
    fn param(&self, name: &str) -> Option<&str>;
}

/// No path parameters
impl PathParams for () {
    fn param(&self, _name: &str) -> Option<&str> {
        None
    }
}

impl PathParams for HashMap<String, String> {
    fn param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl PathParams for [(String, String)] {
    fn param(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl PathParams for Vec<(String, String)> {
    fn param(&self, name: &str) -> Option<&str> {
        self.as_slice().param(name)
    }
}

impl<const N: usize> PathParams for [(&str, &str); N] {
    fn param(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

/// How a list of required scopes is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Some held scope satisfies some required scope
    Any,
    /// Every required scope is satisfied by some held scope
    All,
}

impl MatchMode {
    pub fn evaluate<H, R, P>(self, held: &[H], required: &[R], params: &P) -> bool
    where
        H: AsRef<str>,
        R: AsRef<str>,
        P: PathParams + ?Sized,
    {
        match self {
            Self::Any => has_any(held, required, params),
            Self::All => has_all(held, required, params),
        }
    }
}

/// True if any held scope satisfies any required scope.
///
/// An empty required list is never satisfied.
pub fn has_any<H, R, P>(held: &[H], required: &[R], params: &P) -> bool
where
    H: AsRef<str>,
    R: AsRef<str>,
    P: PathParams + ?Sized,
{
    required
        .iter()
        .filter_map(|r| resolve_required(r.as_ref(), params))
        .any(|r| satisfied_by_any(held, &r))
}

/// True if every required scope is satisfied by some held scope.
///
/// An empty required list is trivially satisfied.
pub fn has_all<H, R, P>(held: &[H], required: &[R], params: &P) -> bool
where
    H: AsRef<str>,
    R: AsRef<str>,
    P: PathParams + ?Sized,
{
    required.iter().all(|r| {
        resolve_required(r.as_ref(), params).is_some_and(|r| satisfied_by_any(held, &r))
    })
}

/// Whether one held scope satisfies one required scope, without path
/// substitution
pub fn scope_matches(held: &str, required: &str) -> bool {
    resolve_required(required, &()).is_some_and(|r| segments_match(held, &r))
}

fn satisfied_by_any<H: AsRef<str>>(held: &[H], required: &[String; SEGMENTS]) -> bool {
    held.iter().any(|h| segments_match(h.as_ref(), required))
}

fn resolve_required<P>(required: &str, params: &P) -> Option<[String; SEGMENTS]>
where
    P: PathParams + ?Sized,
{
    let mut segments = split(required)?;
    let target = &segments[SEGMENTS - 1];
    if target != WILDCARD {
        if let Some(value) = params.param(target) {
            segments[SEGMENTS - 1] = value.to_lowercase();
        }
    }
    Some(segments)
}

fn segments_match(held: &str, required: &[String; SEGMENTS]) -> bool {
    match split(held) {
        Some(held) => held
            .iter()
            .zip(required.iter())
            .all(|(h, r)| h == WILDCARD || h == r),
        // A malformed held scope grants nothing.
        None => false,
    }
}

fn split(scope: &str) -> Option<[String; SEGMENTS]> {
    let lowered = scope.trim().to_lowercase();
    let mut parts = lowered.split(':');
    let resource = parts.next()?.to_string();
    let action = parts.next()?.to_string();
    let target = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some([resource, action, target])
}
