// ABOUTME: Security route handlers exposing the CSRF token retrieval endpoint
// ABOUTME: Lets browser clients read their double-submit token without cookie access
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Security routes
//!
//! The CSRF cookie is httpOnly, so JavaScript clients cannot read it
//! directly. This endpoint echoes the token the middleware already
//! associated with the request, which is safe: same-origin callers hold the
//! cookie anyway, and cross-origin callers are fenced off by CORS.

use crate::constants::routes;
use crate::errors::AppError;
use crate::middleware::csrf::CsrfTokenExtension;
use crate::server::ServerResources;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Response payload for the token retrieval endpoint
#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    /// The token the client must echo on state-changing requests
    pub csrf_token: String,
    /// Usage hint for API consumers
    pub message: String,
}

/// Security routes implementation
pub struct SecurityRoutes;

impl SecurityRoutes {
    /// Create all security routes
    pub fn routes() -> axum::Router<Arc<ServerResources>> {
        use axum::{routing::get, Router};

        Router::new().route(routes::CSRF_TOKEN, get(Self::handle_csrf_token))
    }

    /// Return the CSRF token for the calling client
    ///
    /// The middleware inserts the token into request extensions on every
    /// request while protection is enabled. A missing extension therefore
    /// means CSRF protection is switched off.
    async fn handle_csrf_token(
        token: Option<Extension<CsrfTokenExtension>>,
    ) -> Result<Json<CsrfTokenResponse>, AppError> {
        let Some(Extension(token)) = token else {
            return Err(AppError::unavailable("CSRF protection is disabled"));
        };

        Ok(Json(CsrfTokenResponse {
            csrf_token: token.0.into_inner(),
            message: "Include this value in the X-CSRF-Token header for state-changing requests"
                .into(),
        }))
    }
}
