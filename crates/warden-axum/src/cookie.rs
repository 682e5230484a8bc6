//! Credential extraction and `Set-Cookie` values

use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use warden_auth_core::CookieConfig;

use crate::context::AuthSource;

/// Find the credential for a request: the named cookie first, then an
/// `Authorization: Bearer` header when `allow_bearer` is set.
pub fn extract_credential(
    headers: &HeaderMap,
    cookie_name: &str,
    allow_bearer: bool,
) -> Option<(String, AuthSource)> {
    if let Some(token) = read_cookie(headers, cookie_name) {
        return Some((token, AuthSource::Cookie));
    }
    if allow_bearer {
        if let Some(token) = read_bearer(headers) {
            return Some((token, AuthSource::BearerToken));
        }
    }
    None
}

/// Value of the named cookie, if present and non-empty
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Token from `Authorization: Bearer <token>`; the scheme is matched
/// case-insensitively
pub fn read_bearer(headers: &HeaderMap) -> Option<String> {
    const PREFIX: &str = "bearer ";

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let scheme = value.get(..PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let token = value[PREFIX.len()..].trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// `Set-Cookie` value carrying a token
pub fn token_cookie(config: &CookieConfig, token: &str, max_age_secs: i64) -> String {
    build(config, token, max_age_secs)
}

/// `Set-Cookie` value that removes the credential cookie
pub fn clear_cookie(config: &CookieConfig) -> String {
    build(config, "", 0)
}

/// Whether a response already sets the named cookie
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_once('='))
        .any(|(key, _)| key.trim() == name)
}

/// Convert a cookie string into a header value, dropping values that are
/// not valid header text
pub fn header_value(cookie: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(cookie) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "Cookie is not a valid header value");
            None
        }
    }
}

fn build(config: &CookieConfig, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}",
        config.name, value, config.path, max_age_secs
    );
    if let Some(domain) = &config.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if !config.same_site.is_empty() {
        cookie.push_str("; SameSite=");
        cookie.push_str(&config.same_site);
    }
    if config.secure {
        cookie.push_str("; Secure");
    }
    if config.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie
}
