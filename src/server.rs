use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::event_log::EventLog;
use crate::line::{signature, CallbackRequest, MessagingApi, OutboundMessage, PushMessageRequest};
use crate::relay;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn MessagingApi>,
    pub event_log: Arc<EventLog>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/push", post(push))
        .route("/callback", post(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured port and serve until Ctrl-C or SIGTERM.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let port = state.config.server.port;
    let listener = bind_all_interfaces(port).await?;

    info!("Listening on http://localhost:{port}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Listen on every interface: dual-stack `[::]` where the host has IPv6,
/// `0.0.0.0` otherwise.
async fn bind_all_interfaces(port: u16) -> Result<TcpListener> {
    let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
    match TcpListener::bind(v6).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            warn!("Failed to bind to {v6} ({e}), falling back to IPv4");
            let v4 = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
            TcpListener::bind(v4)
                .await
                .with_context(|| format!("Failed to bind to {v4}"))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

async fn hello() -> &'static str {
    "Hello, world!"
}

#[derive(Debug, Deserialize)]
struct PushParams {
    #[serde(default)]
    text: Option<String>,
}

async fn push(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PushParams>,
) -> Result<String, RelayError> {
    let text = params
        .text
        .filter(|t| !t.is_empty())
        .ok_or(RelayError::BadRequest("text not set"))?;
    let group_id = state
        .config
        .line
        .group_id
        .clone()
        .ok_or(RelayError::ConfigMissing("LINE_GROUP_ID"))?;

    let request = PushMessageRequest {
        to: group_id,
        messages: vec![OutboundMessage::text(text.clone())],
        notification_disabled: false,
    };
    state
        .api
        .push_message(&request)
        .await
        .map_err(RelayError::Upstream)?;

    Ok(format!("pushed: {}\n", text))
}

async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, RelayError> {
    let provided = headers
        .get(signature::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !signature::verify(&state.config.line.channel_secret, &body, provided) {
        return Err(RelayError::InvalidSignature);
    }

    let request = CallbackRequest::parse(&body).map_err(RelayError::InvalidBody)?;
    debug!("Webhook delivery for destination {}", request.destination);
    relay::handle_events(&state.event_log, state.api.as_ref(), &request.events).await;

    Ok(StatusCode::OK)
}
