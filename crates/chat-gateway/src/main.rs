use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use chat_gateway::config::{EventLogBackend, Settings};
use chat_gateway::database::{DbPool, Repository};
use chat_gateway::router::build_router;
use chat_gateway::services::event_log::{
    DisabledPublisher, DispatcherConfig, EventDispatcher, EventPublisher, RedisStreamPublisher,
};
use chat_gateway::services::{Gateway, StaticReplyGenerator};
use chat_gateway::state::AppState;
use chat_gateway::utils::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    info!("🚀 Starting chat gateway v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    let db_pool = DbPool::new(&settings.database).await?;
    info!("✅ Database connection established");

    if settings.database.run_migrations {
        db_pool.migrate().await?;
        info!("✅ Migrations applied");
    }

    let repository = Arc::new(Repository::new(db_pool.clone()));

    let publisher: Arc<dyn EventPublisher> = match settings.event_log.backend {
        EventLogBackend::Redis => {
            Arc::new(RedisStreamPublisher::connect(&settings.event_log).await?)
        }
        EventLogBackend::Disabled => {
            warn!("Event log disabled; chat logs will not be published");
            Arc::new(DisabledPublisher)
        }
    };

    let (events, dispatcher) =
        EventDispatcher::spawn(publisher, DispatcherConfig::from(&settings.event_log));

    let gateway = Arc::new(Gateway::new(
        repository.clone(),
        repository,
        Arc::new(StaticReplyGenerator::new(settings.gateway.mock_reply.clone())),
        events,
        settings.gateway.session_binding,
        settings.database.statement_timeout(),
    ));

    let app = build_router(
        AppState::new(gateway),
        settings.server.request_timeout_seconds,
    );

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dispatcher
        .shutdown(Duration::from_secs(settings.server.shutdown_grace_seconds))
        .await;
    db_pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
