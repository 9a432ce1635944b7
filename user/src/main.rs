//! User service binary.

use anyhow::Context;
use shoply_telemetry::MetricsServer;
use shoply_user::service::UserService;
use shoply_user::store::PgUserStore;
use shoply_user::{UserConfig, routes};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shoply_telemetry::init_tracing();

    let config = UserConfig::from_env().context("failed to read configuration")?;
    tracing::info!(
        listen = %config.listen_addr,
        metrics = %config.metrics_addr,
        "Starting user service"
    );

    let mut metrics_server = MetricsServer::new(config.metrics_addr);
    metrics_server
        .install()
        .context("failed to install metrics recorder")?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PgUserStore::new(pool);
    store.migrate().await.context("failed to run migrations")?;

    let service = Arc::new(UserService::new(Arc::new(store), config.jwt.clone()));

    tokio::spawn(async move {
        if let Err(e) = metrics_server.serve().await {
            tracing::error!(error = %e, "Metrics server terminated");
        }
    });

    let app = routes::router(service);
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .context("failed to bind listener")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
