// ABOUTME: Security response header policies for protection against common web vulnerabilities
// ABOUTME: Provides environment-specific header sets covering XSS, clickjacking, and MIME sniffing
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Security Headers
//!
//! Implements comprehensive security headers to protect against common web
//! vulnerabilities including XSS, clickjacking, and MIME type sniffing.

use crate::config::environment::Environment;
use std::collections::HashMap;

/// Security headers configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Content Security Policy header value
    pub csp: String,
    /// X-Frame-Options header value
    pub frame_options: String,
    /// X-Content-Type-Options header value
    pub content_type_options: String,
    /// Referrer-Policy header value
    pub referrer_policy: String,
    /// Permissions-Policy header value
    pub permissions_policy: String,
    /// Strict-Transport-Security header value (for HTTPS)
    pub hsts: Option<String>,
    /// Cross-Origin-Embedder-Policy header value
    pub coep: String,
    /// Cross-Origin-Opener-Policy header value
    pub coop: String,
    /// Cross-Origin-Resource-Policy header value
    pub corp: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl SecurityConfig {
    /// Create security configuration for the given environment
    #[must_use]
    pub fn from_environment(environment: &Environment) -> Self {
        if environment.is_production() {
            Self::production()
        } else {
            Self::development()
        }
    }

    /// Create a development-friendly security configuration
    #[must_use]
    pub fn development() -> Self {
        Self {
            // More relaxed CSP for development (allows hot reload, dev tools)
            csp: "default-src 'self'; script-src 'self' 'unsafe-inline' 'unsafe-eval'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; font-src 'self' data:; connect-src 'self' http://localhost:* https://localhost:*; frame-ancestors 'none'; object-src 'none'; base-uri 'self';".into(),
            frame_options: "DENY".into(),
            content_type_options: "nosniff".into(),
            referrer_policy: "strict-origin-when-cross-origin".into(),
            permissions_policy: "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()".into(),
            hsts: None, // Disable HSTS for development (HTTP)
            coep: "unsafe-none".into(), // More permissive for dev tools
            coop: "unsafe-none".into(),
            corp: "cross-origin".into(),
        }
    }

    /// Create a production security configuration
    #[must_use]
    pub fn production() -> Self {
        Self {
            // Strict production CSP
            csp: "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'; object-src 'none'; base-uri 'self'; upgrade-insecure-requests;".into(),
            frame_options: "DENY".into(),
            content_type_options: "nosniff".into(),
            referrer_policy: "strict-origin-when-cross-origin".into(),
            permissions_policy: "geolocation=(), microphone=(), camera=(), payment=(), usb=(), magnetometer=(), gyroscope=(), accelerometer=()".into(),
            hsts: Some("max-age=31536000; includeSubDomains; preload".into()), // 1 year
            coep: "require-corp".into(),
            coop: "same-origin".into(),
            corp: "same-origin".into(),
        }
    }

    /// Convert to header map for easy application
    #[must_use]
    pub fn to_headers(&self) -> HashMap<&'static str, String> {
        let mut headers = HashMap::new();

        headers.insert("Content-Security-Policy", self.csp.clone());
        headers.insert("X-Frame-Options", self.frame_options.clone());
        headers.insert("X-Content-Type-Options", self.content_type_options.clone());
        headers.insert("Referrer-Policy", self.referrer_policy.clone());
        headers.insert("Permissions-Policy", self.permissions_policy.clone());
        headers.insert("Cross-Origin-Embedder-Policy", self.coep.clone());
        headers.insert("Cross-Origin-Opener-Policy", self.coop.clone());
        headers.insert("Cross-Origin-Resource-Policy", self.corp.clone());

        if let Some(hsts) = &self.hsts {
            headers.insert("Strict-Transport-Security", hsts.clone());
        }

        headers
    }
}
