use std::sync::Arc;

use courtside_agent::{DialogRuntime, OpenAiOracle, PhotoLocator, RecommendationCoordinator};
use courtside_chat::events::dispatcher_for;
use courtside_chat::transport::{
    ChatTransport, NoopTransport, ReconnectPolicy, StdioTransport, TransportRunner,
};
use courtside_core::catalog::Catalog;
use courtside_core::config::{AppConfig, ChatTransportKind, ConfigError};
use courtside_core::stats::UsageStats;
use thiserror::Error;
use tracing::info;

use crate::audit::TracingAuditSink;
use crate::dialog::DialogService;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<DialogRuntime>,
    pub runner: TransportRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Wires the runtime and transport from an already loaded config.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let catalog = Arc::new(Catalog::builtin());
    let oracle = Arc::new(OpenAiOracle::from_config(&config.llm));
    info!(
        event_name = "system.bootstrap.oracle_configured",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        endpoint = oracle.endpoint(),
        "advisory oracle configured"
    );

    let runtime = Arc::new(
        DialogRuntime::new(
            RecommendationCoordinator::new(catalog, oracle),
            PhotoLocator::new(config.assets.image_root.clone()),
            Arc::new(UsageStats::new()),
        )
        .with_audit_sink(Arc::new(TracingAuditSink)),
    );

    let transport: Arc<dyn ChatTransport> = match config.chat.transport {
        ChatTransportKind::Stdio => Arc::new(StdioTransport::stdio()),
        ChatTransportKind::Noop => Arc::new(NoopTransport),
    };
    let runner = TransportRunner::new(
        transport,
        dispatcher_for(Arc::new(DialogService::new(Arc::clone(&runtime)))),
        ReconnectPolicy::from_config(&config.chat),
    );

    Ok(Application { config, runtime, runner })
}
