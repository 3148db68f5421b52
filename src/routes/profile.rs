// ABOUTME: Profile route handlers for reading and updating the signed-in user
// ABOUTME: Session-protected endpoints that exercise the CSRF validation path
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Profile routes
//!
//! Read and update the authenticated user's profile. The update endpoint is
//! a state-changing POST, so it goes through CSRF validation like any other
//! mutation.

use crate::constants::routes;
use crate::errors::AppError;
use crate::middleware::auth::{require_session, ExtractedSession};
use crate::models::User;
use crate::server::ServerResources;
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Profile payload returned by both endpoints
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: String,
    pub last_active: String,
}

impl ProfileResponse {
    fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at.to_rfc3339(),
            last_active: user.last_active.to_rfc3339(),
        }
    }
}

/// Profile update request
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name; an empty string clears it
    pub display_name: Option<String>,
}

/// Profile routes implementation
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes() -> axum::Router<Arc<ServerResources>> {
        use axum::routing::{get, post};
        use axum::Router;

        Router::new()
            .route(routes::PROFILE, get(Self::handle_get_profile))
            .route(routes::PROFILE_UPDATE, post(Self::handle_update_profile))
    }

    /// Return the signed-in user's profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        Extension(session): Extension<ExtractedSession>,
    ) -> Result<Json<ProfileResponse>, AppError> {
        let ctx = require_session(&session)?;

        let user = resources
            .user_store
            .get_by_id(ctx.user_id)
            .ok_or_else(|| AppError::not_found("User"))?;

        Ok(Json(ProfileResponse::from_user(&user)))
    }

    /// Update the signed-in user's profile
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        Extension(session): Extension<ExtractedSession>,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Json<ProfileResponse>, AppError> {
        let ctx = require_session(&session)?;

        let updated = resources
            .user_store
            .update(ctx.user_id, |user| {
                if let Some(name) = request.display_name {
                    user.display_name = if name.is_empty() { None } else { Some(name) };
                }
                user.last_active = chrono::Utc::now();
            })
            .ok_or_else(|| AppError::not_found("User"))?;

        tracing::info!("Profile updated for user: {}", ctx.user_id);
        Ok(Json(ProfileResponse::from_user(&updated)))
    }
}
