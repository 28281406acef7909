//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use retouch_core::constants::SESSION_SWEEP_INTERVAL_SECS;
use retouch_core::Config;
use retouch_db::{ImageRepository, UserRepository};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry()
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        credit_fee = config.credit_fee,
        debounce_ms = config.debounce_ms,
        session_idle_timeout_secs = config.session_idle_timeout_secs,
        "Configuration loaded and validated successfully"
    );

    // Setup database
    let pool = database::setup_database(&config).await?;

    let state = Arc::new(AppState::new(
        config.clone(),
        Some(pool.clone()),
        Arc::new(ImageRepository::new(pool.clone())),
        Arc::new(UserRepository::new(pool)),
    ));

    state.sessions.start_sweeper(
        Duration::from_secs(config.session_idle_timeout_secs),
        Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS),
    );

    // Setup routes
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
