use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use courtside_agent::DialogRuntime;
use courtside_core::config::LlmConfig;
use courtside_core::stats::UsageSnapshot;
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    runtime: Arc<DialogRuntime>,
    oracle: OracleCheck,
}

impl HealthState {
    pub fn new(runtime: Arc<DialogRuntime>, llm: &LlmConfig) -> Self {
        Self {
            runtime,
            oracle: OracleCheck {
                provider: llm.provider.as_str(),
                model: llm.model.clone(),
                endpoint: llm.endpoint_base().to_owned(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OracleCheck {
    pub provider: &'static str,
    pub model: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub oracle: OracleCheck,
    pub active_conversations: usize,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).route("/stats", get(stats)).with_state(state)
}

/// Binds the endpoint and serves it until `shutdown` fires.
pub async fn spawn(
    bind_address: &str,
    port: u16,
    state: HealthState,
    shutdown: oneshot::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    Ok(tokio::spawn(async move {
        let server = axum::serve(listener, router(state)).with_graceful_shutdown(async {
            let _ = shutdown.await;
        });
        if let Err(error) = server.await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    }))
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck {
            status: "ready",
            detail: "courtside dialog runtime initialized".to_string(),
        },
        oracle: state.oracle.clone(),
        active_conversations: state.runtime.active_conversations(),
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

pub async fn stats(State(state): State<HealthState>) -> Json<UsageSnapshot> {
    Json(state.runtime.stats().snapshot())
}
