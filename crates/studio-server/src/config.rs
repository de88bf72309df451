//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use studio_shared::constants::DEFAULT_HTTP_PORT;
use studio_shared::transitions::TransitionPolicy;

/// Signing secret used when `JWT_SECRET` is not set. Development only.
pub const DEV_JWT_SECRET: &str = "studio-dev-secret-change-me";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./studio.db`
    pub database_path: PathBuf,

    /// HMAC secret for bearer tokens.
    /// Env: `JWT_SECRET`
    pub jwt_secret: String,

    /// Token lifetime in seconds.
    /// Env: `TOKEN_TTL_SECS`
    /// Default: 7 days
    pub token_ttl_secs: i64,

    /// Sustained requests per second per client IP.
    /// Env: `RATE_LIMIT_PER_SEC`
    pub rate_limit_per_sec: f64,

    /// Burst capacity per client IP.
    /// Env: `RATE_LIMIT_BURST`
    pub rate_limit_burst: f64,

    /// Allowed CORS origin. `None` allows any origin.
    /// Env: `FRONTEND_ORIGIN`
    pub frontend_origin: Option<String>,

    /// Booking status transition rules.
    /// Env: `STRICT_STATUS_TRANSITIONS` (true/false)
    /// Default: permissive
    pub transition_policy: TransitionPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./studio.db"),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: 7 * 24 * 60 * 60,
            rate_limit_per_sec: 10.0,
            rate_limit_burst: 30.0,
            frontend_origin: None,
            transition_policy: TransitionPolicy::Permissive,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        match var("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }

        if let Some(val) = var("TOKEN_TTL_SECS") {
            match val.parse::<i64>() {
                Ok(secs) if secs > 0 => config.token_ttl_secs = secs,
                _ => tracing::warn!(value = %val, "Invalid TOKEN_TTL_SECS, using default"),
            }
        }

        if let Some(val) = var("RATE_LIMIT_PER_SEC") {
            match parse_positive(&val) {
                Some(rate) => config.rate_limit_per_sec = rate,
                None => tracing::warn!(value = %val, "Invalid RATE_LIMIT_PER_SEC, using default"),
            }
        }

        if let Some(val) = var("RATE_LIMIT_BURST") {
            match parse_positive(&val) {
                Some(burst) => config.rate_limit_burst = burst,
                None => tracing::warn!(value = %val, "Invalid RATE_LIMIT_BURST, using default"),
            }
        }

        if let Some(origin) = var("FRONTEND_ORIGIN") {
            if !origin.is_empty() {
                config.frontend_origin = Some(origin);
            }
        }

        if let Some(val) = var("STRICT_STATUS_TRANSITIONS") {
            if val == "true" || val == "1" {
                config.transition_policy = TransitionPolicy::Strict;
            }
        }

        config
    }
}

fn parse_positive(val: &str) -> Option<f64> {
    val.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}
