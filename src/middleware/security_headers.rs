// ABOUTME: Middleware applying browser security headers to every HTTP response
// ABOUTME: Stamps CSP, HSTS and related headers from the environment profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Security headers middleware
//!
//! Applies the headers produced by [`crate::security::headers::SecurityConfig`]
//! to every response. The header map is built once at startup and shared
//! through [`ServerResources`].

use crate::security::headers::SecurityConfig;
use crate::server::ServerResources;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::str::FromStr;
use std::sync::Arc;

/// Build a header map from the security configuration
///
/// Invalid header names or values are skipped rather than failing startup.
#[must_use]
pub fn build_security_header_map(security_config: &SecurityConfig) -> HeaderMap {
    let headers = security_config.to_headers();
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        if let Ok(header_name) = HeaderName::from_str(name) {
            if let Ok(header_value) = HeaderValue::from_str(&value) {
                header_map.insert(header_name, header_value);
            }
        }
    }
    header_map
}

/// Middleware that stamps the configured security headers onto each response
pub async fn security_headers_middleware(
    State(resources): State<Arc<ServerResources>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in &resources.security_headers {
        headers.insert(name.clone(), value.clone());
    }

    response
}
