use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use balloonbot_core::session::SessionStore;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

pub const TRANSPORT_MODE: &str = "telegram-long-polling";

/// Shared flag flipped off once the polling loop exits.
#[derive(Clone, Debug)]
pub struct PollingStatus {
    running: Arc<AtomicBool>,
}

impl Default for PollingStatus {
    fn default() -> Self {
        Self { running: Arc::new(AtomicBool::new(true)) }
    }
}

impl PollingStatus {
    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct HealthState {
    sessions: SessionStore,
    polling: PollingStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub transport: HealthCheck,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub fn router(sessions: SessionStore, polling: PollingStatus) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { sessions, polling })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    sessions: SessionStore,
    polling: PollingStatus,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(sessions, polling)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let running = state.polling.is_running();
    let transport = if running {
        HealthCheck { status: "ready", detail: format!("{TRANSPORT_MODE} loop is running") }
    } else {
        HealthCheck { status: "degraded", detail: format!("{TRANSPORT_MODE} loop has stopped") }
    };

    let payload = HealthResponse {
        status: if running { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "balloonbot-server runtime initialized".to_string(),
        },
        transport,
        active_sessions: state.sessions.len(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if running { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}
