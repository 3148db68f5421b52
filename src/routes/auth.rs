// ABOUTME: User authentication route handlers for registration, login, and logout
// ABOUTME: Provides REST endpoints for account management with session and CSRF cookies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Authentication routes for user management
//!
//! This module handles user registration, login, and logout. All handlers
//! are thin wrappers that delegate business logic to the service layer.
//! Login and logout rotate the CSRF token, so a token obtained before
//! authentication never survives the session boundary.

use crate::constants::{cookies, limits, routes};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::User;
use crate::security::cookies::{clear_auth_cookie, set_auth_cookie};
use crate::server::ServerResources;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// User registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub message: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User info for login response
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// User login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub jwt_token: String,
    pub expires_at: String,
    pub user: UserInfo,
    /// Fresh CSRF token issued for the authenticated session. Absent only
    /// when CSRF protection is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

/// Authentication service for business logic
#[derive(Clone)]
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle user registration
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the email is already taken, or
    /// password hashing fails
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        tracing::info!("User registration attempt for email: {}", request.email);

        // Validate email format
        if !Self::is_valid_email(&request.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }

        // Validate password strength
        if !Self::is_valid_password(&request.password) {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {} characters",
                limits::MIN_PASSWORD_LENGTH
            )));
        }

        // Hash password off the async executor
        let password = request.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))?;

        // Create user
        let user = User::new(request.email.clone(), password_hash, request.display_name);
        let user_id = self.resources.user_store.create(user)?;

        AppLogger::log_auth_event(&user_id.to_string(), "register", true, None);
        tracing::info!(
            "User registered successfully: {} ({})",
            request.email,
            user_id
        );

        Ok(RegisterResponse {
            user_id: user_id.to_string(),
            message: "User registered successfully".into(),
        })
    }

    /// Handle user login
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are invalid, the account is inactive,
    /// or token generation fails
    pub async fn login(&self, request: LoginRequest) -> AppResult<(User, String, DateTime<Utc>)> {
        tracing::info!("User login attempt for email: {}", request.email);

        let user = self
            .resources
            .user_store
            .get_by_email(&request.email)
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        // Verify password using spawn_blocking to avoid blocking async executor
        let password = request.password;
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some("bad password"));
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        if !user.is_active {
            tracing::warn!("Login blocked for inactive account: {}", request.email);
            return Err(AppError::auth_invalid("Account is inactive"));
        }

        // Update last active timestamp
        self.resources.user_store.touch_last_active(user.id);

        let jwt_token = self.resources.auth_manager.generate_token(&user)?;
        let expires_at = self.resources.auth_manager.token_expiry();

        AppLogger::log_auth_event(&user.id.to_string(), "login", true, None);
        tracing::info!(
            "User logged in successfully: {} ({})",
            request.email,
            user.id
        );

        Ok((user, jwt_token, expires_at))
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        // Simple email validation
        if email.len() <= 5 {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false; // @ at start or end
        }
        let domain_part = &email[at_pos + 1..];
        domain_part.contains('.')
    }

    /// Validate password strength
    #[must_use]
    pub const fn is_valid_password(password: &str) -> bool {
        password.len() >= limits::MIN_PASSWORD_LENGTH
    }
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes() -> axum::Router<Arc<ServerResources>> {
        use axum::{routing::post, Router};

        Router::new()
            .route(routes::AUTH_REGISTER, post(Self::handle_register))
            .route(routes::AUTH_LOGIN, post(Self::handle_login))
            .route(routes::AUTH_LOGOUT, post(Self::handle_logout))
    }

    /// Handle user registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
        let service = AuthService::new(resources);
        let response = service.register(request).await?;
        Ok((StatusCode::CREATED, Json(response)))
    }

    /// Handle user login
    ///
    /// On success, sets the `auth_token` session cookie and rotates the
    /// CSRF cookie. The fresh CSRF token also rides in the response body so
    /// API clients can pick it up without parsing Set-Cookie.
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let service = AuthService::new(Arc::clone(&resources));
        let (user, jwt_token, expires_at) = service.login(request).await?;

        let secure = resources.config.require_secure_cookies();
        let mut headers = HeaderMap::new();
        set_auth_cookie(
            &mut headers,
            &jwt_token,
            cookies::AUTH_COOKIE_MAX_AGE_SECS,
            secure,
        );

        // Rotate the CSRF token across the login boundary. The protection
        // middleware sees the Set-Cookie on egress and lets it win over any
        // issuance it queued.
        let csrf_token = resources
            .csrf
            .enabled()
            .then(|| resources.csrf.rotate(&mut headers).into_inner());

        let body = LoginResponse {
            jwt_token,
            expires_at: expires_at.to_rfc3339(),
            user: UserInfo {
                user_id: user.id.to_string(),
                email: user.email,
                display_name: user.display_name,
            },
            csrf_token,
        };

        Ok((headers, Json(body)).into_response())
    }

    /// Handle user logout
    ///
    /// Clears the session cookie and rotates the CSRF cookie so the
    /// logged-out browser starts over with a fresh token.
    async fn handle_logout(State(resources): State<Arc<ServerResources>>) -> Response {
        let secure = resources.config.require_secure_cookies();
        let mut headers = HeaderMap::new();
        clear_auth_cookie(&mut headers, secure);

        if resources.csrf.enabled() {
            resources.csrf.rotate(&mut headers);
        }

        tracing::info!("User logged out");
        (
            headers,
            Json(serde_json::json!({"message": "Logged out successfully"})),
        )
            .into_response()
    }
}
