mod config;
mod error;
mod event_log;
mod line;
mod relay;
mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::event_log::EventLog;
use crate::line::LineClient;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Seed the environment from .env if one exists
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,line_echo_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from: {}", path.display());
    }

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Port: {}", config.server.port);
    info!("  Event log: {}", config.event_log.path.display());
    info!("  LINE API: {}", config.line.api_base_url);
    if config.line.group_id.is_none() {
        warn!("LINE_GROUP_ID not set, /push will answer 500");
    }

    let event_log = Arc::new(EventLog::open(&config.event_log.path)?);
    let api = Arc::new(LineClient::new(&config.line));

    let state = Arc::new(AppState {
        config,
        api,
        event_log: event_log.clone(),
    });

    server::serve(state).await?;

    match Arc::try_unwrap(event_log) {
        Ok(log) => log.close()?,
        Err(log) => warn!("Event log still in use at shutdown: {}", log.path().display()),
    }

    Ok(())
}
