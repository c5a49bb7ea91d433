//! Auth cookie construction and parsing.
//!
//! The access token travels in an `HttpOnly` cookie readable by every route;
//! the refresh token cookie is scoped to `/api/auth` so it is only sent to
//! the refresh and logout endpoints.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

use crate::config::ServerConfig;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

const REFRESH_COOKIE_PATH: &str = "/api/auth";

fn build(name: &str, value: &str, path: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie =
        format!("{name}={value}; Path={path}; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` values for a freshly issued token pair.
pub fn session_cookies(config: &ServerConfig, access: &str, refresh: &str) -> [String; 2] {
    [
        build(
            ACCESS_COOKIE,
            access,
            "/",
            config.jwt.access_token_expiry_mins * 60,
            config.cookie_secure,
        ),
        build(
            REFRESH_COOKIE,
            refresh,
            REFRESH_COOKIE_PATH,
            config.jwt.refresh_token_expiry_days * 24 * 60 * 60,
            config.cookie_secure,
        ),
    ]
}

/// `Set-Cookie` values that expire both auth cookies.
pub fn clear_session_cookies(config: &ServerConfig) -> [String; 2] {
    [
        build(ACCESS_COOKIE, "", "/", 0, config.cookie_secure),
        build(REFRESH_COOKIE, "", REFRESH_COOKIE_PATH, 0, config.cookie_secure),
    ]
}

/// Read a cookie value from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
