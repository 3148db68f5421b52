// ABOUTME: Secure cookie construction and parsing helpers for session and CSRF cookies
// ABOUTME: Builds Set-Cookie values with hardened attribute defaults and reads request cookies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Cookie utilities
//!
//! All cookies issued by the server go through [`SecureCookieConfig`] so the
//! attribute defaults (`HttpOnly`, `Secure`, `SameSite=Strict`, `Path=/`)
//! apply uniformly. The `Secure` attribute is relaxed only outside
//! production, where clients talk plain HTTP.

use crate::constants::cookies;
use axum::http::{header, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

/// Builder for a hardened `Set-Cookie` value
#[derive(Debug, Clone)]
pub struct SecureCookieConfig {
    name: String,
    value: String,
    max_age_secs: i64,
    http_only: bool,
    secure: bool,
    path: String,
}

impl SecureCookieConfig {
    /// Create a cookie with hardened defaults: `HttpOnly`, `Secure`,
    /// `SameSite=Strict`, `Path=/`
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age_secs,
            http_only: true,
            secure: true,
            path: "/".into(),
        }
    }

    /// Override the `Secure` attribute (development over plain HTTP)
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the `HttpOnly` attribute
    #[must_use]
    pub const fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Render the `Set-Cookie` header value
    #[must_use]
    pub fn build(&self) -> String {
        let mut cookie = format!(
            "{}={}; Max-Age={}; Path={}",
            self.name, self.value, self.max_age_secs, self.path
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str("; SameSite=Strict");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Append this cookie to response headers
    pub fn apply(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(&self.build()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => {
                error!(cookie.name = %self.name, "Failed to encode cookie header: {e}");
            }
        }
    }
}

/// Set the session cookie carrying the JWT
pub fn set_auth_cookie(headers: &mut HeaderMap, token: &str, max_age_secs: i64, secure: bool) {
    SecureCookieConfig::new(cookies::AUTH_COOKIE, token, max_age_secs)
        .with_secure(secure)
        .apply(headers);
}

/// Clear the session cookie
pub fn clear_auth_cookie(headers: &mut HeaderMap, secure: bool) {
    SecureCookieConfig::new(cookies::AUTH_COOKIE, "", 0)
        .with_secure(secure)
        .apply(headers);
}

/// Set the double-submit CSRF cookie.
///
/// The cookie is `HttpOnly`; script clients obtain the token from the
/// token endpoint or the login response instead of `document.cookie`.
pub fn set_csrf_cookie(headers: &mut HeaderMap, token: &str, secure: bool) {
    SecureCookieConfig::new(
        cookies::CSRF_COOKIE,
        token,
        cookies::CSRF_COOKIE_MAX_AGE_SECS,
    )
    .with_secure(secure)
    .apply(headers);
}

/// Extract a cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(name).map(|cookie| cookie.value().to_owned())
}
