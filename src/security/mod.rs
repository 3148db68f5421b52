// ABOUTME: Security module grouping cookie handling, CSRF protection, and response headers
// ABOUTME: Exposes the building blocks consumed by the HTTP middleware stack
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Security primitives
//!
//! - **cookies**: hardened `Set-Cookie` construction and request parsing
//! - **csrf**: stateless double-submit token generation and validation
//! - **headers**: environment-specific security response headers

/// Secure cookie construction and parsing
pub mod cookies;
/// CSRF token generation and double-submit validation
pub mod csrf;
/// Security response header policies
pub mod headers;
