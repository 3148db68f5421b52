// ABOUTME: Main library entry point for the Barbican CSRF protection server
// ABOUTME: Provides double-submit cookie CSRF middleware and a host HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

// Crate-level attributes:
// - recursion_limit: Increased from default 128 to 256 for complex derive macros
//   (serde, thiserror) on deeply nested types
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Barbican
//!
//! A stateless CSRF protection layer for axum services, built around the
//! double-submit cookie pattern. The browser holds a long-lived `csrf_token`
//! cookie; every state-changing request must repeat the value in the
//! `X-CSRF-Token` header or a `csrf_token` form field, and the two copies
//! are compared in constant time. No token state lives server-side.
//!
//! ## Features
//!
//! - **Stateless validation**: the cookie is the only token state
//! - **Constant-time comparison**: token equality never leaks timing
//! - **Form fallback**: urlencoded and multipart bodies are searched for the
//!   token without consuming them for downstream handlers
//! - **Rotation on session boundaries**: login and logout replace the token
//! - **Path exemptions**: health checks and docs can opt out via config
//!
//! ## Quick Start
//!
//! 1. Configure via environment variables (`CSRF_ENABLED`, `CSRF_EXEMPT_PATHS`)
//! 2. Start the server with `barbican-server`
//! 3. Fetch a token from `GET /api/security/csrf-token` and echo it in the
//!    `X-CSRF-Token` header on every mutation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use barbican::config::environment::ServerConfig;
//! use barbican::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     // Load configuration
//!     let config = ServerConfig::from_env()?;
//!
//!     println!("Barbican configured with port: HTTP={}", config.http_port);
//!
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by the binary crate (src/bin/) and integration
// tests (tests/). They must remain `pub` so external consumers can access
// them.

/// Authentication and session management
pub mod auth;

/// Configuration management and environment loading
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware for CSRF protection, sessions, and response hardening
pub mod middleware;

/// Common data models for user accounts
pub mod models;

/// `HTTP` routes for authentication, profile, and security endpoints
pub mod routes;

/// CSRF tokens, cookies, and browser security headers
pub mod security;

/// Server assembly, shared resources, and the serve loop
pub mod server;
