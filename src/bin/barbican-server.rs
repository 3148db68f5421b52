// ABOUTME: Server binary wiring configuration, logging, and the HTTP stack
// ABOUTME: Production entry point with CSRF protection and cookie sessions
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![recursion_limit = "256"]

//! # Barbican Server Binary
//!
//! Starts the HTTP API with JWT cookie sessions and stateless double-submit
//! CSRF protection.

use anyhow::Result;
use barbican::{config::environment::ServerConfig, logging, server};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "barbican-server")]
#[command(about = "Barbican - HTTP API with stateless double-submit CSRF protection")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle container environments where clap may not work properly
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Argument parsing failed: {e}");
            eprintln!("Using default configuration");
            Args { http_port: None }
        }
    };

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;

    // Override port if specified
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Barbican HTTP API");
    info!("{}", config.summary());

    // Display all available API endpoints
    display_available_endpoints(&config);

    info!("Ready to serve requests");

    if let Err(e) = server::run_server(Arc::new(config)).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints with their ports
fn display_available_endpoints(config: &ServerConfig) {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    info!("=== Available API Endpoints ===");
    display_auth_endpoints(&host, config.http_port);
    display_profile_endpoints(&host, config.http_port);
    display_security_endpoints(&host, config.http_port);
    display_health_endpoints(&host, config.http_port);
    info!("=== End of Endpoint List ===");
}

#[allow(clippy::cognitive_complexity)]
fn display_auth_endpoints(host: &str, port: u16) {
    info!("Authentication:");
    info!("   User Registration: POST http://{host}:{port}/api/auth/register");
    info!("   User Login:        POST http://{host}:{port}/api/auth/login");
    info!("   User Logout:       POST http://{host}:{port}/api/auth/logout");
}

#[allow(clippy::cognitive_complexity)]
fn display_profile_endpoints(host: &str, port: u16) {
    info!("Profile:");
    info!("   Get Profile:       GET  http://{host}:{port}/api/profile");
    info!("   Update Profile:    POST http://{host}:{port}/api/profile/update");
}

#[allow(clippy::cognitive_complexity)]
fn display_security_endpoints(host: &str, port: u16) {
    info!("Security:");
    info!("   CSRF Token:        GET  http://{host}:{port}/api/security/csrf-token");
}

#[allow(clippy::cognitive_complexity)]
fn display_health_endpoints(host: &str, port: u16) {
    info!("Monitoring:");
    info!("   Health Check:      GET  http://{host}:{port}/health");
    info!("   Readiness Check:   GET  http://{host}:{port}/ready");
}
