// ABOUTME: HTTP middleware for CSRF protection, sessions, and response hardening
// ABOUTME: Provides request validation, context propagation, and header stamping

pub mod auth;
pub mod cors;
pub mod csrf;
pub mod security_headers;

// Session context middleware
pub use auth::{require_session, session_context_middleware, ExtractedSession, SessionContext};

// CORS configuration
pub use cors::setup_cors;

// CSRF protection middleware
pub use csrf::{csrf_protection_middleware, requires_csrf_validation, CsrfTokenExtension};

// Browser security headers
pub use security_headers::{build_security_header_map, security_headers_middleware};
