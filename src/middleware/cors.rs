// ABOUTME: CORS middleware configuration for HTTP API endpoints
// ABOUTME: Provides Cross-Origin Resource Sharing setup for web client access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use http::{header::HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Configure CORS settings for the HTTP server
///
/// Configures cross-origin requests based on `CORS_ALLOWED_ORIGINS` environment variable.
/// Supports both wildcard ("*") for development and specific origin lists for production.
///
/// # Security Considerations
///
/// - Uses `CORS_ALLOWED_ORIGINS` environment variable for origin control
/// - Falls back to wildcard (*) if the configured list is empty or "*"
/// - Permits standard HTTP methods (GET, POST, PUT, DELETE, OPTIONS, PATCH)
/// - Exposes the CSRF header so browser clients can send their token
///
/// # Allowed Headers
///
/// - Standard headers: content-type, authorization, accept, origin
/// - CORS headers: x-requested-with, access-control-request-*
/// - CSRF header: x-csrf-token
///
/// # Examples
///
/// ```bash
/// # Allow all origins (development)
/// export CORS_ALLOWED_ORIGINS="*"
///
/// # Allow specific origins (production)
/// export CORS_ALLOWED_ORIGINS="https://app.example.com,https://admin.example.com"
/// ```
pub fn setup_cors(config: &crate::config::environment::ServerConfig) -> CorsLayer {
    // Parse allowed origins from configuration
    let origins = &config.security.cors_origins;
    let allow_origin = if origins.is_empty() || origins.iter().any(|o| o == "*") {
        // Development mode: allow any origin
        AllowOrigin::any()
    } else {
        // Production mode: use the configured origin list
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
            .collect();

        if parsed.is_empty() {
            // Fallback to any if parsing failed
            AllowOrigin::any()
        } else {
            AllowOrigin::list(parsed)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("access-control-request-method"),
            HeaderName::from_static("access-control-request-headers"),
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
}
