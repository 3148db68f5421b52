// ABOUTME: CSRF (Cross-Site Request Forgery) protection token generation and validation
// ABOUTME: Implements the stateless double-submit cookie pattern with constant-time comparison
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! CSRF protection module
//!
//! Implements the stateless double-submit cookie pattern. Each browser holds
//! a long-lived `csrf_token` cookie; state-changing requests must repeat the
//! value in the `X-CSRF-Token` header or a `csrf_token` form field. The two
//! copies are compared in constant time and nothing is stored server-side:
//! the cookie itself is the only state.

use crate::config::environment::CsrfConfig;
use crate::errors::{AppError, AppResult};
use crate::security::cookies::set_csrf_cookie;
use axum::http::{HeaderMap, Method};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// CSRF token length in bytes (32 bytes = 256 bits)
const CSRF_TOKEN_LENGTH: usize = 32;

/// A freshly issued CSRF token.
///
/// `Debug` output is redacted so token values never reach logs through
/// formatting. Use [`CsrfToken::as_str`] or [`CsrfToken::into_inner`] at the
/// points where the value is deliberately sent to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Wrap an existing token value, such as one read back from a cookie
    #[must_use]
    pub const fn from_value(value: String) -> Self {
        Self(value)
    }

    /// Borrow the token value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, yielding the value for a response body
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CsrfToken(<redacted>)")
    }
}

/// Generates URL-safe CSRF tokens from the operating system CSPRNG
pub struct TokenGenerator {
    _probe: (),
}

impl TokenGenerator {
    /// Create a generator, probing the OS random number generator once.
    ///
    /// # Errors
    ///
    /// Returns an error when no entropy source is available. Callers must
    /// treat this as fatal; there is no degraded token mode.
    pub fn new() -> AppResult<Self> {
        let mut probe = [0u8; CSRF_TOKEN_LENGTH];
        OsRng.try_fill_bytes(&mut probe).map_err(|e| {
            AppError::config(format!(
                "CRITICAL: OS random number generator unavailable: {e}"
            ))
        })?;
        Ok(Self { _probe: () })
    }

    /// Generate a fresh token: 32 random bytes, base64 URL-safe without padding
    #[must_use]
    pub fn generate(&self) -> CsrfToken {
        let mut bytes = [0u8; CSRF_TOKEN_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        CsrfToken(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// A single path exemption rule.
///
/// `Exact` matches the full request path; `Prefix` matches the path and
/// everything below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExemptionRule {
    Exact(String),
    Prefix(String),
}

impl ExemptionRule {
    /// Parse a rule from its configuration form. A trailing `*` marks a
    /// prefix rule.
    #[must_use]
    pub fn parse(rule: &str) -> Self {
        rule.strip_suffix('*').map_or_else(
            || Self::Exact(rule.to_owned()),
            |prefix| Self::Prefix(prefix.to_owned()),
        )
    }

    /// Check whether the rule covers `path`
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Why a request failed CSRF validation.
///
/// Only [`RejectionReason::public_code`] and [`RejectionReason::detail`]
/// reach clients; token values never appear in either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// No `csrf_token` cookie accompanied the request
    MissingCookie,
    /// The cookie is present but no header or form-field copy was supplied
    MissingRequestToken,
    /// The cookie and request copies disagree
    TokenMismatch,
}

impl RejectionReason {
    /// Stable wire code carried in the 403 body
    #[must_use]
    pub const fn public_code(&self) -> &'static str {
        match self {
            Self::MissingCookie | Self::MissingRequestToken => "csrf_token_missing",
            Self::TokenMismatch => "csrf_token_invalid",
        }
    }

    /// Human-readable detail carried in the 403 body
    #[must_use]
    pub const fn detail(&self) -> &'static str {
        match self {
            Self::MissingCookie => {
                "CSRF cookie is missing; perform a GET request first to obtain one"
            }
            Self::MissingRequestToken => {
                "CSRF token missing from X-CSRF-Token header and csrf_token form field"
            }
            Self::TokenMismatch => "CSRF token does not match the value bound to this browser",
        }
    }

    /// Short identifier for structured logs
    #[must_use]
    pub const fn log_label(&self) -> &'static str {
        match self {
            Self::MissingCookie => "missing_cookie",
            Self::MissingRequestToken => "missing_request_token",
            Self::TokenMismatch => "token_mismatch",
        }
    }
}

/// Validator verdict for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Request may proceed to the handler
    Allowed,
    /// Request must be refused with 403
    Rejected(RejectionReason),
}

/// Compare two token values in constant time.
///
/// Both values are hashed to fixed-width digests first, so the comparison
/// cost is independent of the position of the first difference and of the
/// input lengths.
#[must_use]
pub fn tokens_match(cookie_token: &str, request_token: &str) -> bool {
    let cookie_digest = Sha256::digest(cookie_token.as_bytes());
    let request_digest = Sha256::digest(request_token.as_bytes());
    cookie_digest
        .as_slice()
        .ct_eq(request_digest.as_slice())
        .into()
}

/// Stateless CSRF manager.
///
/// Issues tokens, applies the double-submit cookie, and validates that the
/// cookie and request copies agree. Exemptions are parsed once at
/// construction and shared immutably.
pub struct CsrfManager {
    generator: TokenGenerator,
    exemptions: Arc<[ExemptionRule]>,
    enabled: bool,
    secure_cookies: bool,
}

impl CsrfManager {
    /// Build a manager from configuration.
    ///
    /// # Arguments
    /// * `config` - Enablement flag and exemption rules
    /// * `secure_cookies` - Whether issued cookies carry the `Secure` attribute
    ///
    /// # Errors
    /// Returns an error when the OS random number generator is unavailable
    pub fn new(config: &CsrfConfig, secure_cookies: bool) -> AppResult<Self> {
        let generator = TokenGenerator::new()?;
        let exemptions: Arc<[ExemptionRule]> = config
            .exempt_paths
            .iter()
            .map(|rule| ExemptionRule::parse(rule))
            .collect();

        Ok(Self {
            generator,
            exemptions,
            enabled: config.enabled,
            secure_cookies,
        })
    }

    /// Whether CSRF protection is active
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Issue a fresh token without touching any response
    #[must_use]
    pub fn issue_token(&self) -> CsrfToken {
        self.generator.generate()
    }

    /// Safe methods never require a token
    #[must_use]
    pub fn is_safe_method(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
        )
    }

    /// Check the exemption list for `path`
    #[must_use]
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exemptions.iter().any(|rule| rule.matches(path))
    }

    /// Whether this request must present a valid token pair
    #[must_use]
    pub fn requires_validation(&self, method: &Method, path: &str) -> bool {
        self.enabled && !Self::is_safe_method(method) && !self.is_exempt(path)
    }

    /// Validate one request given both token copies.
    ///
    /// The order of checks is fixed: safe method, exemption, cookie
    /// presence, request-copy presence, constant-time agreement.
    #[must_use]
    pub fn validate(
        &self,
        method: &Method,
        path: &str,
        cookie_token: Option<&str>,
        request_token: Option<&str>,
    ) -> ValidationOutcome {
        if !self.requires_validation(method, path) {
            return ValidationOutcome::Allowed;
        }

        let Some(cookie) = cookie_token else {
            return ValidationOutcome::Rejected(RejectionReason::MissingCookie);
        };

        let Some(request) = request_token else {
            return ValidationOutcome::Rejected(RejectionReason::MissingRequestToken);
        };

        if tokens_match(cookie, request) {
            ValidationOutcome::Allowed
        } else {
            ValidationOutcome::Rejected(RejectionReason::TokenMismatch)
        }
    }

    /// Append the double-submit cookie for `token` to response headers
    pub fn apply_cookie(&self, headers: &mut HeaderMap, token: &CsrfToken) {
        set_csrf_cookie(headers, token.as_str(), self.secure_cookies);
    }

    /// Unconditionally replace the browser token: issue a fresh one, set its
    /// cookie on `headers`, and return it so a response body can carry it.
    /// Used at login and logout so pre-authentication tokens die with the
    /// session boundary.
    pub fn rotate(&self, headers: &mut HeaderMap) -> CsrfToken {
        let token = self.issue_token();
        self.apply_cookie(headers, &token);
        token
    }
}
