use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};

use super::jwt;

pub const BOND_ACCESS: &str = "bond_access";
pub const BOND_REFRESH: &str = "bond_refresh";

fn cookie_secure() -> bool {
    crate::config::env_or("COOKIE_SECURE", false)
}

fn cookie_domain() -> Option<String> {
    crate::config::env_non_empty("COOKIE_DOMAIN")
}

fn session_cookie(name: &'static str, value: &str, max_age: cookie::time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(cookie_secure());

    if let Some(domain) = cookie_domain() {
        cookie = cookie.domain(domain);
    }
    cookie.build()
}

fn append_cookie(headers: &mut HeaderMap, cookie: Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(cookie = cookie.name(), error = %e, "Invalid Set-Cookie value"),
    }
}

/// Set-Cookie for the access token.
pub fn build_access_cookie(token: &str, max_age_minutes: i64) -> Cookie<'static> {
    session_cookie(BOND_ACCESS, token, cookie::time::Duration::minutes(max_age_minutes))
}

/// Set-Cookie for the refresh token.
pub fn build_refresh_cookie(token: &str, max_age_days: i64) -> Cookie<'static> {
    session_cookie(BOND_REFRESH, token, cookie::time::Duration::days(max_age_days))
}

/// Extract the access token from cookies (preferred) or Bearer header (fallback).
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, BOND_ACCESS) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Extract the refresh token from cookies.
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, BOND_REFRESH)
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// Set both access and refresh cookies using the current JWT expiry config.
pub fn set_auth_cookies(headers: &mut HeaderMap, access_token: &str, refresh_token: &str) {
    append_cookie(
        headers,
        build_access_cookie(access_token, jwt::access_token_expiry_minutes()),
    );
    append_cookie(
        headers,
        build_refresh_cookie(refresh_token, jwt::refresh_token_expiry_days()),
    );
}

/// Expire both auth cookies.
pub fn clear_auth_cookies(headers: &mut HeaderMap) {
    append_cookie(headers, session_cookie(BOND_ACCESS, "", cookie::time::Duration::ZERO));
    append_cookie(headers, session_cookie(BOND_REFRESH, "", cookie::time::Duration::ZERO));
}
