// ABOUTME: CSRF protection middleware using the stateless double-submit cookie pattern
// ABOUTME: Issues token cookies and validates state-changing requests in constant time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! CSRF protection middleware
//!
//! Implements the stateless double-submit cookie pattern. Any request arriving
//! without a `csrf_token` cookie gets one issued on the response. State-changing
//! requests (everything except GET, HEAD, OPTIONS, TRACE) must echo the cookie
//! value in the `X-CSRF-Token` header or a `csrf_token` form field; the two
//! copies are compared in constant time. The cookie is the only token state,
//! nothing is stored server-side.
//!
//! Rejections are `403 Forbidden` with a JSON body:
//!
//! ```json
//! {"error_type": "csrf_token_missing", "detail": "CSRF cookie not present on request"}
//! ```

use crate::constants::{cookies, limits};
use crate::security::cookies::get_cookie_value;
use crate::security::csrf::{CsrfManager, CsrfToken, RejectionReason, ValidationOutcome};
use crate::server::ServerResources;
use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use http::{header, Method, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Current CSRF token for this client, inserted into request extensions
///
/// Carries the incoming cookie token, or the token freshly issued for this
/// request when no cookie was present. Handlers that need to expose the token
/// (the token endpoint, login responses) read it from here instead of parsing
/// cookies again.
#[derive(Debug, Clone)]
pub struct CsrfTokenExtension(pub CsrfToken);

impl CsrfTokenExtension {
    /// The token value as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// CSRF protection middleware
///
/// This middleware:
/// 1. Reads the `csrf_token` cookie; issues a fresh token when absent
/// 2. Injects [`CsrfTokenExtension`] into request extensions
/// 3. Validates state-changing requests against the cookie in constant time
/// 4. Sets the token cookie on the response when one was issued
///
/// A token rotation performed by a downstream handler (login, logout) wins
/// over the issuance queued here: if the response already carries a
/// `csrf_token` cookie, this middleware leaves it alone.
pub async fn csrf_protection_middleware(
    State(resources): State<Arc<ServerResources>>,
    req: Request,
    next: Next,
) -> Response {
    let csrf = &resources.csrf;

    // Disabled protection is fully inert: no validation, no cookie issuance.
    if !csrf.enabled() {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let cookie_token = get_cookie_value(req.headers(), cookies::CSRF_COOKIE);

    // Mint a token now when the client has none, so the handler extension and
    // the Set-Cookie on egress carry the same value.
    let (issued, current_token) = match cookie_token.as_deref() {
        Some(tok) => (None, CsrfToken::from_value(tok.to_owned())),
        None => {
            let fresh = csrf.issue_token();
            (Some(fresh.clone()), fresh)
        }
    };

    let needs_validation = csrf.requires_validation(&method, &path);
    let mut req = req;
    let mut request_token = None;

    if needs_validation {
        let (rebuilt, extracted) = extract_request_token(req).await;
        req = rebuilt;
        request_token = extracted;
    }

    req.extensions_mut()
        .insert(CsrfTokenExtension(current_token));

    match csrf.validate(&method, &path, cookie_token.as_deref(), request_token.as_deref()) {
        ValidationOutcome::Allowed => {
            if needs_validation {
                debug!(
                    method = %method,
                    path = %path,
                    "CSRF token validated successfully"
                );
            }
        }
        ValidationOutcome::Rejected(reason) => {
            let ip = client_ip(&req);
            warn!(
                method = %method,
                path = %path,
                client_ip = %ip,
                reason = reason.log_label(),
                "CSRF validation rejected request"
            );
            return rejection_response(reason, issued.as_ref(), csrf);
        }
    }

    let mut response = next.run(req).await;

    if let Some(token) = issued {
        // A rotation performed by the handler takes precedence over the
        // issuance queued at ingress.
        if !response_sets_csrf_cookie(&response) {
            csrf.apply_cookie(response.headers_mut(), &token);
        }
    }

    response
}

/// Whether the response already carries a `csrf_token` Set-Cookie
fn response_sets_csrf_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", cookies::CSRF_COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().is_ok_and(|s| s.trim_start().starts_with(&prefix)))
}

/// Build the 403 rejection response
///
/// The queued cookie still rides along so the client can retry with a valid
/// token pair without an extra round trip.
fn rejection_response(
    reason: RejectionReason,
    issued: Option<&CsrfToken>,
    csrf: &CsrfManager,
) -> Response {
    let body = Json(serde_json::json!({
        "error_type": reason.public_code(),
        "detail": reason.detail(),
    }));

    let mut response = (StatusCode::FORBIDDEN, body).into_response();
    if let Some(token) = issued {
        csrf.apply_cookie(response.headers_mut(), token);
    }
    response
}

/// Pull the request-side token copy from the header or a form body
///
/// The `X-CSRF-Token` header wins. The form fallback only runs for
/// urlencoded and multipart content types: the body is buffered (up to
/// [`limits::FORM_BUFFER_MAX_BYTES`]) and the request reconstructed so
/// downstream handlers can still read it. JSON bodies are never parsed.
async fn extract_request_token(req: Request) -> (Request, Option<String>) {
    if let Some(token) = header_token(&req) {
        return (req, Some(token));
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(ToOwned::to_owned)
        .unwrap_or_default();

    let lowered = content_type.to_ascii_lowercase();
    let is_urlencoded = lowered.starts_with("application/x-www-form-urlencoded");
    let is_multipart = lowered.starts_with("multipart/form-data");

    if !is_urlencoded && !is_multipart {
        return (req, None);
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, limits::FORM_BUFFER_MAX_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Oversized or unreadable form bodies count as carrying no token.
            // The request is rejected downstream, so the lost body is moot.
            debug!("Failed to buffer form body for CSRF check: {}", e);
            return (Request::from_parts(parts, Body::empty()), None);
        }
    };

    let token = if is_urlencoded {
        token_from_urlencoded(&bytes)
    } else {
        token_from_multipart(&content_type, bytes.clone()).await
    };

    (Request::from_parts(parts, Body::from(bytes)), token)
}

/// Non-empty `X-CSRF-Token` header value, if present
fn header_token(req: &Request) -> Option<String> {
    req.headers()
        .get(cookies::CSRF_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

/// Find the `csrf_token` field in a urlencoded body
fn token_from_urlencoded(bytes: &Bytes) -> Option<String> {
    url::form_urlencoded::parse(bytes)
        .find(|(key, _)| key == cookies::CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Find the `csrf_token` field in a multipart body
async fn token_from_multipart(content_type: &str, bytes: Bytes) -> Option<String> {
    let boundary = multer::parse_boundary(content_type).ok()?;
    let stream =
        futures_util::stream::once(std::future::ready(Ok::<Bytes, std::io::Error>(bytes)));
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(cookies::CSRF_FORM_FIELD) {
            return field.text().await.ok();
        }
    }
    None
}

/// Best-effort client address for rejection logs
fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Whether this middleware would demand a token pair for the given method
#[must_use]
pub fn requires_csrf_validation(method: &Method) -> bool {
    !CsrfManager::is_safe_method(method)
}
