mod api;
mod config;
mod error;
mod response;

use crate::api::AppState;
use crate::config::ServerConfig;
use cogflow_engine::{Engine, EngineConfig, MemoryLedger};
use cogflow_scheduler::CronRunner;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let ledger = Arc::new(MemoryLedger::new());
    let rules = Arc::new(cogflow_rules::builtin_registry());
    let engine = Arc::new(Engine::new(
        ledger,
        rules,
        EngineConfig {
            step_timeout: Duration::from_secs(config.engine.step_timeout_seconds),
        },
    ));

    // Spawn the cron trigger runner
    let runner = CronRunner::new(
        engine.clone(),
        Duration::from_secs(config.cron.poll_interval_seconds),
    );
    tokio::spawn(runner.run());

    let app = api::router(AppState { engine });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown requested");
}
