// ABOUTME: JWT-based user authentication for cookie and bearer sessions
// ABOUTME: Handles token generation, validation, and JWT secret bootstrap
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Authentication and Session Management
//!
//! This module provides JWT-based authentication for the server. Tokens are
//! signed with HS256 using a secret loaded from (or generated into) a local
//! secret file at startup. Sessions are carried entirely by the token; no
//! session state is held server-side.

use crate::constants::{crypto, limits::JWT_EXPIRY_HOURS};
use crate::models::User;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Convert a duration to a human-readable format
fn humanize_duration(duration: Duration) -> String {
    let total_secs = duration.num_seconds().abs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    if hours > 0 {
        format!("{hours} hours")
    } else if minutes > 0 {
        format!("{minutes} minutes")
    } else {
        format!("{total_secs} seconds")
    }
}

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let duration_expired = current_time.signed_duration_since(*expired_at);
                if duration_expired.num_minutes() < 60 {
                    write!(
                        f,
                        "JWT token expired {} minutes ago at {}",
                        duration_expired.num_minutes(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                } else if duration_expired.num_hours() < JWT_EXPIRY_HOURS {
                    write!(
                        f,
                        "JWT token expired {} hours ago at {}",
                        duration_expired.num_hours(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                } else {
                    write!(
                        f,
                        "JWT token expired {} days ago at {}",
                        duration_expired.num_days(),
                        expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )
                }
            }
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authentication manager for `JWT` tokens
pub struct AuthManager {
    token_expiry_hours: i64,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Monotonic counter to ensure unique timestamps for tokens
    token_counter: AtomicU64,
}

impl Clone for AuthManager {
    fn clone(&self) -> Self {
        Self {
            token_expiry_hours: self.token_expiry_hours,
            encoding_key: self.encoding_key.clone(),
            decoding_key: self.decoding_key.clone(),
            // Start fresh counter for cloned instance - each instance
            // maintains uniqueness independently
            token_counter: AtomicU64::new(0),
        }
    }
}

impl AuthManager {
    /// Create a new authentication manager from an HS256 secret
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_hours: i64) -> Self {
        Self {
            token_expiry_hours,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_counter: AtomicU64::new(0),
        }
    }

    /// Generate a `JWT` token for a user with HS256 signing
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails due to invalid claims
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        // Use atomic counter to ensure unique issued-at times
        let counter = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let unique_iat =
            now.timestamp() * 1000 + i64::from(u32::try_from(counter % 1000).unwrap_or(0));

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: unique_iat,
            exp: expiry.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    /// When a token issued now would expire
    #[must_use]
    pub fn token_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::hours(self.token_expiry_hours)
    }

    /// Validate an HS256 JWT token
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Token signature is invalid
    /// - Token has expired
    /// - Token is malformed or not valid JWT format
    /// - Token claims cannot be deserialized
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("JWT validation failed")?;

        Ok(token_data.claims)
    }

    /// Validate an HS256 JWT token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if:
    /// - Token signature is invalid
    /// - Token has expired
    /// - Token is malformed or not valid JWT format
    /// - Token claims cannot be deserialized
    pub fn validate_token_detailed(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let claims = self.decode_token_claims(token)?;
        Self::validate_claims_expiry(&claims)?;

        tracing::debug!("JWT token validation successful for user: {}", claims.sub);
        Ok(claims)
    }

    /// Decode JWT token claims without expiration validation
    fn decode_token_claims(&self, token: &str) -> Result<Claims, JwtValidationError> {
        let mut validation_no_exp = Validation::new(Algorithm::HS256);
        validation_no_exp.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation_no_exp)
            .map(|token_data| token_data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))
    }

    /// Validate claims expiration with detailed logging
    fn validate_claims_expiry(claims: &Claims) -> Result<(), JwtValidationError> {
        let current_time = Utc::now();
        let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        if current_time.timestamp() > claims.exp {
            let time_since_expiry = current_time.signed_duration_since(expired_at);
            tracing::warn!(
                "JWT token expired for user: {} - Expired {} ago at {}",
                claims.sub,
                humanize_duration(time_since_expiry),
                expired_at.to_rfc3339()
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }
        Ok(())
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        tracing::warn!("JWT token validation failed: {:?}", e);

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            ErrorKind::Utf8(utf8_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid UTF-8: {utf8_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}

/// Generate a random `JWT` secret
///
/// # Errors
///
/// Returns an error if system RNG fails - this is a critical security failure
/// and the server cannot operate securely without working RNG
pub fn generate_jwt_secret() -> Result<[u8; crypto::JWT_SECRET_LENGTH]> {
    use ring::rand::{SecureRandom, SystemRandom};

    let rng = SystemRandom::new();
    let mut secret = [0u8; crypto::JWT_SECRET_LENGTH];

    rng.fill(&mut secret).map_err(|e| {
        tracing::error!(
            "CRITICAL: Failed to generate cryptographically secure JWT secret: {}",
            e
        );
        anyhow::anyhow!("System RNG failure - cannot generate secure JWT secret")
    })?;

    Ok(secret)
}

/// Load the `JWT` secret from file or generate and persist a new one
///
/// # Errors
///
/// Returns an error if:
/// - The secret file exists but has the wrong length
/// - Filesystem reads or writes fail
/// - System RNG fails while generating a new secret
pub fn load_or_generate_jwt_secret(secret_file: &Path) -> Result<[u8; crypto::JWT_SECRET_LENGTH]> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = secret_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if secret_file.exists() {
        let secret_data = std::fs::read(secret_file)?;
        if secret_data.len() != crypto::JWT_SECRET_LENGTH {
            return Err(anyhow::anyhow!(
                "Invalid JWT secret length: expected {} bytes, got {}",
                crypto::JWT_SECRET_LENGTH,
                secret_data.len()
            ));
        }

        let mut secret = [0u8; crypto::JWT_SECRET_LENGTH];
        secret.copy_from_slice(&secret_data);
        Ok(secret)
    } else {
        let secret = generate_jwt_secret()?;
        std::fs::write(secret_file, secret)?;
        tracing::info!("Generated new JWT secret: {}", secret_file.display());
        Ok(secret)
    }
}
