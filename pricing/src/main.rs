//! Pricing service binary.
//!
//! Wires configuration, Postgres, the Kafka bus, the engine, the
//! `ProductAdded` consumer, the HTTP API, and the metrics endpoint.

use anyhow::Context;
use shoply_bus::KafkaEventBus;
use shoply_core::bus::EventBus;
use shoply_pricing::engine::PricingEngine;
use shoply_pricing::store::PgPriceStore;
use shoply_pricing::{PricingConfig, consumer, routes};
use shoply_telemetry::MetricsServer;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shoply_telemetry::init_tracing();

    let config = PricingConfig::from_env().context("failed to read configuration")?;
    tracing::info!(
        listen = %config.listen_addr,
        metrics = %config.metrics_addr,
        brokers = %config.kafka_brokers,
        "Starting pricing service"
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

    let store = PgPriceStore::new(pool);
    store.migrate().await.context("failed to run migrations")?;

    let bus: Arc<dyn EventBus> = Arc::new(
        KafkaEventBus::builder()
            .brokers(&config.kafka_brokers)
            .consumer_group(&config.consumer_group)
            .build()
            .context("failed to create event bus")?,
    );

    let engine = Arc::new(PricingEngine::new(Arc::new(store), bus.clone()));

    // ProductAdded consumer runs for the lifetime of the process.
    let consumer_engine = engine.clone();
    let consumer_bus = bus.clone();
    tokio::spawn(async move {
        if let Err(e) = consumer::run(consumer_engine, consumer_bus).await {
            tracing::error!(error = %e, "Pricing consumer terminated");
        }
    });

    tokio::spawn(async move {
        if let Err(e) = metrics_server.serve().await {
            tracing::error!(error = %e, "Metrics server terminated");
        }
    });

    let app = routes::router(engine);
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
