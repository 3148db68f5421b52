// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management for production deployment

use crate::constants::{env_config, routes};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info, // Default fallback
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and other configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development, // Default fallback for unrecognized values
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a testing environment
    #[must_use]
    pub const fn is_testing(&self) -> bool {
        matches!(self, Self::Testing)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// CSRF protection configuration
    pub csrf: CsrfConfig,
    /// Security settings
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key path
    pub jwt_secret_path: PathBuf,
    /// JWT expiry time in hours
    pub jwt_expiry_hours: i64,
}

/// CSRF protection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfConfig {
    /// Enable CSRF validation and token issuance
    pub enabled: bool,
    /// Paths exempt from validation. A trailing `*` marks a prefix rule.
    pub exempt_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Security headers configuration
    pub headers: SecurityHeadersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityHeadersConfig {
    /// Environment type for security headers (development, production)
    pub environment: Environment,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable fails to parse or the
    /// resulting configuration is invalid
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {e}");
        }

        let environment = Environment::from_str_or_default(&env_config::environment());

        let config = Self {
            http_port: env_config::http_port(),
            log_level: LogLevel::from_str_or_default(&env_config::log_level()),

            auth: AuthConfig {
                jwt_secret_path: PathBuf::from(env_config::jwt_secret_path()),
                jwt_expiry_hours: env_config::jwt_expiry_hours(),
            },

            csrf: CsrfConfig {
                enabled: env_config::csrf_enabled(),
                exempt_paths: env_config::csrf_exempt_paths()
                    .map_or_else(default_exempt_paths, |raw| parse_path_list(&raw)),
            },

            security: SecurityConfig {
                cors_origins: parse_origins(&env_config::cors_allowed_origins()),
                headers: SecurityHeadersConfig {
                    environment: Environment::from_str_or_default(&env_var_or(
                        "SECURITY_HEADERS_ENV",
                        &environment.to_string(),
                    )),
                },
            },

            environment,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is out of range or malformed
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be positive"));
        }

        for rule in &self.csrf.exempt_paths {
            let path = rule.strip_suffix('*').unwrap_or(rule);
            if !path.starts_with('/') {
                return Err(anyhow::anyhow!(
                    "CSRF exempt path rule must start with '/': {rule}"
                ));
            }
        }

        if self.environment.is_production() && self.security.cors_origins == ["*"] {
            warn!("CORS allows any origin in production; set CORS_ALLOWED_ORIGINS");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Barbican Server Configuration:\n\
             - HTTP Port: {}\n\
             - Log Level: {}\n\
             - Environment: {}\n\
             - JWT Expiry: {}h\n\
             - CSRF Protection: {}\n\
             - CSRF Exempt Rules: {}\n\
             - CORS Origins: {}",
            self.http_port,
            self.log_level,
            self.environment,
            self.auth.jwt_expiry_hours,
            if self.csrf.enabled {
                "Enabled"
            } else {
                "Disabled"
            },
            self.csrf.exempt_paths.len(),
            self.security.cors_origins.join(", "),
        )
    }

    /// Check if cookies must carry the `Secure` attribute
    #[must_use]
    pub const fn require_secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Parse comma-separated path rules
fn parse_path_list(paths_str: &str) -> Vec<String> {
    paths_str
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Built-in exemptions: health probes and API documentation
fn default_exempt_paths() -> Vec<String> {
    routes::DEFAULT_CSRF_EXEMPT
        .iter()
        .map(|&s| s.to_owned())
        .collect()
}
