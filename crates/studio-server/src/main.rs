//! # studio-server
//!
//! HTTP backend for the studio-booking marketplace.
//!
//! This binary provides:
//! - **Bookings** by signed-in clients or anonymous guests, with price
//!   derivation, owner notification and owner-only status changes
//! - **Listings** with an admin-gated visibility workflow and public discovery
//! - **Accounts** with argon2 password hashing and JWT bearer tokens
//! - **Messages**, **reviews** and **admin** reporting
//! - **Per-IP rate limiting** to protect against abuse

mod accounts;
mod admin;
mod api;
mod auth;
mod bookings;
mod config;
mod error;
mod listings;
mod messaging;
mod rate_limit;
mod reviews;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use studio_store::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,studio_server=debug")),
        )
        .init();

    info!(
        "Starting {} server v{}",
        studio_shared::constants::APP_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        database = %config.database_path.display(),
        transitions = ?config.transition_policy,
        cors_origin = config.frontend_origin.as_deref().unwrap_or("*"),
        "Loaded configuration"
    );

    let store = SqliteStore::open_at(&config.database_path)?;
    let http_addr = config.http_addr;
    let state = AppState::new(Arc::new(store), config);

    // Evict rate-limit buckets idle for more than 10 minutes.
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.purge_stale(600.0).await;
        }
    });

    tokio::select! {
        result = api::serve(state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
