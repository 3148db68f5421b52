// ABOUTME: System-wide constants and configuration values for the Barbican server
// ABOUTME: Contains cookie names, route paths, limits, and environment configuration defaults
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! This module provides both hardcoded constants and environment variable configuration.

use std::env;

/// Service identity constants
pub mod service {
    use std::env;

    /// Get server name from environment or default
    #[must_use]
    pub fn server_name() -> String {
        env::var("SERVER_NAME").unwrap_or_else(|_| "barbican-server".into())
    }

    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Default server name for contexts that cannot read the environment
    pub const SERVER_NAME: &str = "barbican-server";
}

/// Environment-based configuration
pub mod env_config {
    use super::env;

    /// Get `HTTP` server port from environment or default
    #[must_use]
    pub fn http_port() -> u16 {
        env::var("HTTP_PORT")
            .unwrap_or_else(|_| super::ports::DEFAULT_HTTP_PORT.to_string())
            .parse()
            .unwrap_or(super::ports::DEFAULT_HTTP_PORT)
    }

    /// Get `JWT` secret path from environment or default
    #[must_use]
    pub fn jwt_secret_path() -> String {
        env::var("JWT_SECRET_PATH").unwrap_or_else(|_| "./data/jwt.secret".into())
    }

    /// Get `JWT` expiry hours from environment or default
    #[must_use]
    pub fn jwt_expiry_hours() -> i64 {
        env::var("JWT_EXPIRY_HOURS")
            .unwrap_or_else(|_| super::limits::JWT_EXPIRY_HOURS.to_string())
            .parse()
            .unwrap_or(super::limits::JWT_EXPIRY_HOURS)
    }

    /// Get log level from environment or default
    #[must_use]
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    }

    /// Get deployment environment from environment or default
    #[must_use]
    pub fn environment() -> String {
        env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
    }

    /// Get CSRF protection toggle from environment or default (enabled)
    #[must_use]
    pub fn csrf_enabled() -> bool {
        env::var("CSRF_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(true)
    }

    /// Get raw CSRF exemption list from environment (comma-separated paths)
    #[must_use]
    pub fn csrf_exempt_paths() -> Option<String> {
        env::var("CSRF_EXEMPT_PATHS").ok()
    }

    /// Get allowed `CORS` origins from environment or default (any origin)
    #[must_use]
    pub fn cors_allowed_origins() -> String {
        env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".into())
    }
}

/// Cookie names and attributes
pub mod cookies {
    /// Session cookie carrying the `JWT`
    pub const AUTH_COOKIE: &str = "auth_token";

    /// Double-submit CSRF cookie
    pub const CSRF_COOKIE: &str = "csrf_token";

    /// Request header carrying the CSRF token copy
    pub const CSRF_HEADER: &str = "x-csrf-token";

    /// Form field carrying the CSRF token copy (urlencoded and multipart bodies)
    pub const CSRF_FORM_FIELD: &str = "csrf_token";

    /// CSRF cookie lifetime: one year, token validity is bounded by rotation instead
    pub const CSRF_COOKIE_MAX_AGE_SECS: i64 = 31_536_000;

    /// Session cookie lifetime, matches the default `JWT` expiry
    pub const AUTH_COOKIE_MAX_AGE_SECS: i64 = 86_400;
}

/// Default port configurations
pub mod ports {
    /// Default `HTTP` server port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// `HTTP` routes and paths
pub mod routes {
    /// Authentication routes
    pub const AUTH_REGISTER: &str = "/api/auth/register";
    pub const AUTH_LOGIN: &str = "/api/auth/login";
    pub const AUTH_LOGOUT: &str = "/api/auth/logout";

    /// Profile routes
    pub const PROFILE: &str = "/api/profile";
    pub const PROFILE_UPDATE: &str = "/api/profile/update";

    /// Security routes
    pub const CSRF_TOKEN: &str = "/api/security/csrf-token";

    /// Health checks
    pub const HEALTH: &str = "/health";
    pub const READY: &str = "/ready";

    /// Paths exempt from CSRF validation when no override is configured.
    /// A trailing `*` marks a prefix rule.
    pub const DEFAULT_CSRF_EXEMPT: &[&str] = &["/health", "/ready", "/api/docs*"];
}

/// Numeric limits and thresholds
pub mod limits {
    /// Authentication
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    pub const JWT_EXPIRY_HOURS: i64 = 24;

    /// Largest form body the CSRF middleware will buffer looking for a token.
    /// Larger bodies are treated as carrying no token; clients use the header.
    pub const FORM_BUFFER_MAX_BYTES: usize = 64 * 1024;

    /// Request body cap applied by the outer middleware stack
    pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
}

/// Timeout and duration constants
pub mod timeouts {
    /// Per-request timeout applied by the outer middleware stack
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Cryptographic and security constants
pub mod crypto {
    /// `JWT` secret length in bytes
    pub const JWT_SECRET_LENGTH: usize = 64;
}
