// ABOUTME: Core data models for user accounts and the in-memory user store
// ABOUTME: Defines User, UserStore and related account state structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Data Models
//!
//! Core data structures shared across the server: user accounts and the
//! concurrent in-memory store that backs the authentication routes.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// User email address (used for identification)
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
    /// Hashed password for authentication
    pub password_hash: String,
    /// When the user account was created
    pub created_at: DateTime<Utc>,
    /// Last time user accessed the system
    pub last_active: DateTime<Utc>,
    /// Whether the user account is active
    pub is_active: bool,
}

impl User {
    /// Create a new user with a freshly generated id
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            created_at: now,
            last_active: now,
            is_active: true,
        }
    }
}

/// Concurrent in-memory user store keyed by lowercased email
///
/// Session state never lives here. Authentication is carried entirely by the
/// JWT cookie, so the store only holds account records.
#[derive(Debug, Default)]
pub struct UserStore {
    users: DashMap<String, User>,
}

impl UserStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Insert a new user account
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] with `ResourceAlreadyExists` if an account with
    /// the same email (case-insensitive) already exists.
    pub fn create(&self, user: User) -> AppResult<Uuid> {
        let key = user.email.to_lowercase();
        if self.users.contains_key(&key) {
            return Err(AppError::already_exists(format!(
                "User account for {}",
                user.email
            )));
        }
        let id = user.id;
        self.users.insert(key, user);
        Ok(id)
    }

    /// Look up a user by email (case-insensitive)
    #[must_use]
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        self.users
            .get(&email.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    /// Look up a user by id
    #[must_use]
    pub fn get_by_id(&self, id: Uuid) -> Option<User> {
        self.users
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone())
    }

    /// Update the last-active timestamp for a user
    pub fn touch_last_active(&self, id: Uuid) {
        if let Some(mut entry) = self.users.iter_mut().find(|entry| entry.value().id == id) {
            entry.value_mut().last_active = Utc::now();
        }
    }

    /// Apply an update to a user record by id
    ///
    /// Returns the updated user, or `None` if no account matches.
    pub fn update<F>(&self, id: Uuid, apply: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        self.users
            .iter_mut()
            .find(|entry| entry.value().id == id)
            .map(|mut entry| {
                apply(entry.value_mut());
                entry.value().clone()
            })
    }

    /// Number of registered accounts
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store has no accounts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
