mod audit;
mod bootstrap;
mod dialog;
mod health;

use std::time::Duration;

use anyhow::Result;
use courtside_chat::transport::TransportRunner;
use courtside_core::config::{AppConfig, LoadOptions};
use tokio::sync::oneshot;

fn init_logging(config: &AppConfig) {
    use courtside_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Config errors are fatal before anything else starts.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let health_task = health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState::new(app.runtime.clone(), &app.config.llm),
        shutdown_rx,
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        transport = app.runner.transport_kind(),
        "courtside-server started"
    );

    tokio::select! {
        result = serve_transport(&app.runner) => result?,
        result = wait_for_shutdown() => result?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = app.config.server.graceful_shutdown_secs,
        "courtside-server stopping"
    );

    let _ = shutdown_tx.send(());
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, health_task).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "health endpoint did not stop within the grace period"
        );
    }

    Ok(())
}

/// Returns when the transport's input ends; a noop transport never ends on its own.
async fn serve_transport(runner: &TransportRunner) -> Result<()> {
    runner.start().await?;
    if runner.transport_kind() == "noop" {
        std::future::pending::<()>().await;
    }
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
