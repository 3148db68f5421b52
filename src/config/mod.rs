// ABOUTME: Configuration management module for centralized server settings and parameters
// ABOUTME: Handles environment configs, deployment modes, and runtime options
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
//! Configuration module for the Barbican server
//!
//! This module provides centralized configuration management:
//!
//! - **Environment**: Server configuration from environment variables,
//!   including the CSRF exemption list and the cookie security posture

/// Environment and server configuration
pub mod environment;

// Re-export main configuration types from environment
pub use environment::{Environment, LogLevel, ServerConfig};
