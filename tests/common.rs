// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common config, resource, and user creation helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::wildcard_in_or_patterns,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]
//! Shared test utilities for `barbican`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use anyhow::Result;
use barbican::{
    auth::{generate_jwt_secret, AuthManager},
    config::environment::{
        AuthConfig, CsrfConfig, Environment, LogLevel, SecurityConfig, SecurityHeadersConfig,
        ServerConfig,
    },
    models::User,
    server::ServerResources,
};
use std::path::PathBuf;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Baseline test configuration: CSRF enabled with the default exemptions,
/// testing environment (cookies issued without the `Secure` attribute)
pub fn test_config() -> ServerConfig {
    test_config_with_csrf(true, &["/health", "/ready", "/api/docs*"])
}

/// Test configuration with explicit CSRF settings
pub fn test_config_with_csrf(enabled: bool, exempt_paths: &[&str]) -> ServerConfig {
    ServerConfig {
        http_port: 8081,
        log_level: LogLevel::default(),
        environment: Environment::Testing,
        auth: AuthConfig {
            jwt_secret_path: PathBuf::from("./data/test-jwt.secret"),
            jwt_expiry_hours: 24,
        },
        csrf: CsrfConfig {
            enabled,
            exempt_paths: exempt_paths.iter().map(|&path| path.to_owned()).collect(),
        },
        security: SecurityConfig {
            cors_origins: vec!["*".to_owned()],
            headers: SecurityHeadersConfig {
                environment: Environment::Testing,
            },
        },
    }
}

/// Create a test authentication manager with a throwaway secret
pub fn create_test_auth_manager() -> Result<AuthManager> {
    let jwt_secret = generate_jwt_secret()?;
    Ok(AuthManager::new(&jwt_secret, 24))
}

/// Standard test `ServerResources` with the baseline configuration
pub fn create_test_resources() -> Result<Arc<ServerResources>> {
    create_test_resources_with(test_config())
}

/// Test `ServerResources` built from a custom configuration
pub fn create_test_resources_with(config: ServerConfig) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let resources = ServerResources::new(Arc::new(config), create_test_auth_manager()?)?;
    Ok(Arc::new(resources))
}

/// Password used by `create_test_user`
pub const TEST_PASSWORD: &str = "password123";

/// Create a standard test user directly in the store.
///
/// Uses a low bcrypt cost to keep the suite fast; the registration route
/// exercises the production cost separately.
pub fn create_test_user(resources: &ServerResources, email: &str) -> Result<Uuid> {
    let password_hash = bcrypt::hash(TEST_PASSWORD, 4)?;
    let user = User::new(
        email.to_owned(),
        password_hash,
        Some("Test User".to_owned()),
    );
    Ok(resources.user_store.create(user)?)
}
