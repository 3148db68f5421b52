// ABOUTME: Tower middleware for extracting authenticated sessions from JWT credentials
// ABOUTME: Injects SessionContext into request extensions for route handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Session Context Middleware
//!
//! This middleware extracts the authenticated session from JWT tokens and
//! injects it into Axum request extensions. Route handlers can then access
//! the session without re-validating the JWT token.
//!
//! # Design
//!
//! The middleware extracts credentials from:
//! 1. The `auth_token` httpOnly cookie (primary, web clients)
//! 2. The `Authorization: Bearer` header (fallback, API clients)
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::Extension;
//! use barbican::middleware::auth::ExtractedSession;
//!
//! async fn handler(
//!     Extension(session): Extension<ExtractedSession>,
//! ) -> String {
//!     match session.0 {
//!         Some(ctx) => format!("Hello {}", ctx.email),
//!         None => "No session".to_owned(),
//!     }
//! }
//! ```

use crate::constants::cookies;
use crate::errors::AppError;
use crate::security::cookies::get_cookie_value;
use crate::server::ServerResources;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Authenticated session resolved from a validated JWT
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Authenticated user id
    pub user_id: Uuid,
    /// Authenticated user email
    pub email: String,
}

/// Extracted session wrapper for request extensions
///
/// This wrapper is inserted into request extensions by the middleware.
/// It contains `Option<SessionContext>` because:
/// - Some routes are public and don't require authentication
/// - Some routes have optional authentication
/// - Authentication may fail gracefully
#[derive(Debug, Clone)]
pub struct ExtractedSession(pub Option<SessionContext>);

impl ExtractedSession {
    /// Get the session context if available
    #[must_use]
    pub const fn get(&self) -> Option<&SessionContext> {
        self.0.as_ref()
    }

    /// Check if a session is present
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.0.is_some()
    }

    /// Get the user ID if available
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|ctx| ctx.user_id)
    }
}

/// Session middleware that extracts the authenticated user from JWT credentials
///
/// This middleware:
/// 1. Extracts the JWT token from the `auth_token` cookie or Authorization header
/// 2. Validates the token and extracts claims
/// 3. Injects `ExtractedSession` into request extensions
///
/// The middleware does NOT reject requests without valid authentication.
/// Instead, it injects `ExtractedSession(None)` for unauthenticated requests.
/// Route handlers can then decide whether to require authentication.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{Router, routing::get, middleware};
/// use barbican::middleware::auth::session_context_middleware;
/// use barbican::server::ServerResources;
/// use std::sync::Arc;
///
/// # async fn handler() -> &'static str { "" }
/// # fn example(resources: Arc<ServerResources>) {
/// let app: Router<Arc<ServerResources>> = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(resources.clone(), session_context_middleware));
/// # }
/// ```
pub async fn session_context_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut req: Request,
    next: Next,
) -> Response {
    let headers = req.headers();

    // Try to extract JWT token from cookie first (web clients)
    let token = get_cookie_value(headers, cookies::AUTH_COOKIE).or_else(|| {
        // Fall back to Authorization header (API clients)
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .map(ToOwned::to_owned)
    });

    let session = if let Some(token) = token {
        extract_session_from_token(&token, &resources)
    } else {
        debug!("No authentication token found, proceeding without session");
        None
    };

    // Record session in tracing span
    if let Some(ref ctx) = session {
        tracing::Span::current().record("user_id", ctx.user_id.to_string());
    }

    // Insert session into request extensions
    req.extensions_mut().insert(ExtractedSession(session));

    next.run(req).await
}

/// Extract a session from a validated JWT token
fn extract_session_from_token(
    token: &str,
    resources: &Arc<ServerResources>,
) -> Option<SessionContext> {
    let claims = match resources.auth_manager.validate_token_detailed(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("JWT validation failed in session middleware: {}", e);
            return None;
        }
    };

    let user_id = match claims.sub.parse::<Uuid>() {
        Ok(id) => id,
        Err(e) => {
            warn!(sub = %claims.sub, error = %e, "Invalid user ID in JWT claims");
            return None;
        }
    };

    Some(SessionContext {
        user_id,
        email: claims.email,
    })
}

/// Require session extractor
///
/// Use this in route handlers that REQUIRE an authenticated session.
/// Returns an error response if no session is available.
///
/// # Errors
///
/// Returns `AppError::auth_required` if no session is present, indicating
/// that authentication is required but was not provided.
///
/// # Example
///
/// ```rust,no_run
/// use axum::{Extension, response::IntoResponse};
/// use barbican::middleware::auth::{ExtractedSession, require_session};
/// use barbican::errors::AppError;
///
/// async fn protected_handler(
///     Extension(session): Extension<ExtractedSession>,
/// ) -> Result<impl IntoResponse, AppError> {
///     let ctx = require_session(&session)?;
///     Ok(format!("Welcome {}", ctx.email))
/// }
/// ```
pub fn require_session(extracted: &ExtractedSession) -> Result<&SessionContext, AppError> {
    extracted.get().ok_or_else(AppError::auth_required)
}
