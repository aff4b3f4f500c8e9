//! qna-escalation server binary.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use qna_escalation::adapters::escalation::{
    EmailChannel, EmailChannelConfig, WebhookChannel, WebhookChannelConfig,
};
use qna_escalation::adapters::http::{app_router, TurnAppState};
use qna_escalation::adapters::qna::{LanguageQnaConfig, LanguageQnaService, MockQnaService};
use qna_escalation::adapters::rendering::TemplateCardRenderer;
use qna_escalation::adapters::storage::{FileStateStorage, InMemoryStateStorage};
use qna_escalation::application::dialogs::{build_dialog_machine, QnaDialogSettings};
use qna_escalation::application::escalation::{EscalationDispatcher, EscalationWorker};
use qna_escalation::application::pipeline::{TurnPipeline, TurnSettings};
use qna_escalation::config::{AppConfig, ConfigError, QnaBackend, StorageBackend};
use qna_escalation::ports::{CardRenderer, EscalationChannel, QnaService, StateStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate().map_err(ConfigError::from)?;

    let storage: Arc<dyn StateStorage> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryStateStorage::new()),
        StorageBackend::File => Arc::new(FileStateStorage::new(&config.storage.path)),
    };

    let qna: Arc<dyn QnaService> = match config.qna.backend {
        QnaBackend::Language => Arc::new(LanguageQnaService::new(
            LanguageQnaConfig::from_app_config(&config.qna)?,
        )),
        QnaBackend::Mock => Arc::new(MockQnaService::new()),
    };

    let renderer: Arc<dyn CardRenderer> = Arc::new(TemplateCardRenderer::new());

    let channels: Vec<Arc<dyn EscalationChannel>> = vec![
        Arc::new(EmailChannel::new(
            EmailChannelConfig::from_app_config(&config.email)
                .with_timeout(config.bot.dispatch_timeout()),
        )),
        Arc::new(WebhookChannel::new(
            WebhookChannelConfig::from_app_config(&config.webhook)
                .with_timeout(config.bot.dispatch_timeout()),
        )),
    ];
    let dispatcher = EscalationDispatcher::new(channels, config.bot.dispatch_timeout());
    if dispatcher.enabled_channels().is_empty() {
        tracing::warn!("No escalation channel is configured; escalations will be dropped");
    }
    let worker = Arc::new(EscalationWorker::new(
        Arc::new(dispatcher),
        config.bot.escalation_concurrency,
    ));

    let machine = build_dialog_machine(
        qna,
        Arc::clone(&renderer),
        config.bot.negative_feedback_threshold,
        QnaDialogSettings::from_config(&config.qna, &config.bot),
    );
    let pipeline = TurnPipeline::new(
        storage,
        Arc::new(machine),
        renderer,
        Arc::clone(&worker),
        TurnSettings::from_config(&config.bot),
    );

    let app = app_router(
        TurnAppState::new(Arc::new(pipeline)),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let report = worker.drain(config.bot.drain_timeout()).await;
    tracing::info!(
        completed = report.completed,
        aborted = report.aborted,
        "Shutdown complete"
    );
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.is_production() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialised: {}", e);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, draining");
}
