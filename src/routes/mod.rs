// ABOUTME: Route module organization for the HTTP server endpoints
// ABOUTME: Provides centralized route definitions organized by domain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Route modules for the HTTP server
//!
//! This module organizes all HTTP routes by domain for better maintainability
//! and clear separation of concerns. Each domain module contains only route
//! definitions and thin handler functions that delegate to service layers.

/// Authentication and authorization routes
pub mod auth;
/// Health check and system status routes
pub mod health;
/// Profile routes for the signed-in user
pub mod profile;
/// Security routes (CSRF token retrieval)
pub mod security;

/// Authentication route handlers and service
pub use auth::{AuthRoutes, AuthService};

/// Health check route handlers
pub use health::HealthRoutes;

/// Profile route handlers
pub use profile::ProfileRoutes;

/// Security route handlers
pub use security::SecurityRoutes;
