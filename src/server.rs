// ABOUTME: HTTP server assembly with shared resources, router, and middleware stack
// ABOUTME: Binds the listener and runs axum with graceful shutdown on Ctrl-C or SIGTERM
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Server Module
//!
//! Owns the shared resource container, assembles the router with the full
//! middleware stack, and runs the HTTP server. The middleware order on
//! ingress is: request id, tracing, timeout, body limit, CORS, security
//! headers, session extraction, and CSRF protection closest to the routes.

use crate::auth::{load_or_generate_jwt_secret, AuthManager};
use crate::config::environment::ServerConfig;
use crate::constants::{limits, timeouts};
use crate::errors::AppResult;
use crate::middleware::{
    build_security_header_map, csrf_protection_middleware, security_headers_middleware,
    session_context_middleware, setup_cors,
};
use crate::models::UserStore;
use crate::routes::{AuthRoutes, HealthRoutes, ProfileRoutes, SecurityRoutes};
use crate::security::csrf::CsrfManager;
use crate::security::headers::SecurityConfig;
use anyhow::Result;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    middleware, Router,
};
use http::HeaderMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use zeroize::Zeroize;

/// Centralized resource container shared by middleware and route handlers
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// JWT authentication manager
    pub auth_manager: Arc<AuthManager>,
    /// In-memory user store
    pub user_store: Arc<UserStore>,
    /// CSRF protection manager
    pub csrf: Arc<CsrfManager>,
    /// Precomputed browser security headers
    pub security_headers: HeaderMap,
}

impl ServerResources {
    /// Create new server resources with proper Arc sharing
    ///
    /// # Errors
    ///
    /// Returns an error if the CSRF manager cannot be constructed, which
    /// happens when the operating system RNG is unavailable.
    pub fn new(config: Arc<ServerConfig>, auth_manager: AuthManager) -> AppResult<Self> {
        let csrf = CsrfManager::new(&config.csrf, config.require_secure_cookies())?;
        let headers_profile = SecurityConfig::from_environment(&config.security.headers.environment);
        let security_headers = build_security_header_map(&headers_profile);

        Ok(Self {
            config,
            auth_manager: Arc::new(auth_manager),
            user_store: Arc::new(UserStore::new()),
            csrf: Arc::new(csrf),
            security_headers,
        })
    }
}

/// Assemble the application router with the full middleware stack
#[must_use]
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(HealthRoutes::routes())
        .merge(SecurityRoutes::routes())
        .merge(AuthRoutes::routes())
        .merge(ProfileRoutes::routes());

    // ServiceBuilder applies layers top-down on ingress; CSRF protection is
    // added last so it runs closest to the routes, after session extraction.
    api.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id,
                        user_id = tracing::field::Empty,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(
                timeouts::REQUEST_TIMEOUT_SECS,
            )))
            .layer(DefaultBodyLimit::max(limits::MAX_REQUEST_BODY_BYTES))
            .layer(setup_cors(&resources.config))
            .layer(middleware::from_fn_with_state(
                Arc::clone(resources),
                security_headers_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                Arc::clone(resources),
                session_context_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                Arc::clone(resources),
                csrf_protection_middleware,
            )),
    )
    .with_state(Arc::clone(resources))
}

/// Run the HTTP server until a shutdown signal arrives
///
/// Loads (or generates) the JWT secret, builds the shared resources and
/// router, binds the listener, and serves with graceful shutdown.
///
/// # Errors
///
/// Returns an error if the JWT secret cannot be loaded, resources cannot be
/// constructed, the listener cannot bind, or the server fails while running.
pub async fn run_server(config: Arc<ServerConfig>) -> Result<()> {
    let mut jwt_secret = load_or_generate_jwt_secret(&config.auth.jwt_secret_path)?;
    let auth_manager = AuthManager::new(&jwt_secret, config.auth.jwt_expiry_hours);
    jwt_secret.zeroize();

    let resources = Arc::new(ServerResources::new(Arc::clone(&config), auth_manager)?);
    let app = build_router(&resources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolve when the process receives Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
