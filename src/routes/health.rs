// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides system health and readiness endpoints for monitoring infrastructure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Health check routes for service monitoring
//!
//! This module provides health and readiness endpoints for monitoring and
//! load balancer health checks. Both are exempt from CSRF validation.

use crate::constants::{routes, service};
use crate::server::ServerResources;
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes() -> axum::Router<Arc<ServerResources>> {
        use axum::{routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "service": service::SERVER_NAME,
                "version": service::SERVER_VERSION,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        async fn ready_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "ready",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new()
            .route(routes::HEALTH, get(health_handler))
            .route(routes::READY, get(ready_handler))
    }
}
