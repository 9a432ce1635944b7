//! Prometheus metrics endpoint.
//!
//! Each service binary creates one [`MetricsServer`], which installs the
//! global `metrics` recorder and serves the rendered registry over HTTP.
//! Service code records through the `metrics` macros; nothing here is
//! service-specific except the description registry.

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the Prometheus exporter.
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the Prometheus recorder.
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind the HTTP listener.
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// # Example
///
/// ```rust,no_run
/// use shoply_telemetry::MetricsServer;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
/// server.install()?;
/// tokio::spawn(async move { server.serve().await });
/// // Metrics available at http://localhost:9090/metrics
/// # Ok(())
/// # }
/// ```
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a metrics server that will bind to `addr`.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the global recorder and register metric descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] or [`MetricsError::Install`] if the
    /// exporter cannot be set up. When a recorder is already installed
    /// (re-initialization inside tests), the call logs and succeeds without
    /// replacing it.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Serve `GET /metrics` until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Bind`] if the listener cannot be bound.
    pub async fn serve(self) -> Result<(), MetricsError> {
        let handle = self.handle;
        let app = Router::new().route(
            "/metrics",
            get(move || {
                let body = handle.as_ref().map(PrometheusHandle::render).unwrap_or_default();
                async move { body }
            }),
        );

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(
            addr = %self.addr,
            "Metrics endpoint available at http://{}/metrics",
            self.addr
        );
        axum::serve(listener, app).await?;
        Ok(())
    }

    /// Render the current registry (for tests and ad-hoc inspection).
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register descriptions for every domain metric the services emit.
///
/// Emitting an undescribed metric still works; this just makes the exported
/// series self-documenting.
pub fn register_metrics() {
    // Pricing service
    describe_counter!(
        "prices_added_total",
        "Price records created from ProductAdded events"
    );
    describe_counter!("prices_updated_total", "Price update operations applied");
    describe_counter!("discounts_applied_total", "Discounts applied to products");
    describe_gauge!("active_discounts", "Discounts currently marked active");
    describe_histogram!("price_amount", "Distribution of updated price amounts");
    describe_histogram!(
        "price_change_frequency",
        "Batch size of price changes per update call"
    );

    // Product service
    describe_counter!("products_added_total", "Products created in the catalog");
    describe_counter!("products_updated_total", "Product update operations applied");
    describe_counter!("products_deleted_total", "Products removed from the catalog");
    describe_gauge!("products_total", "Products currently in the catalog");
    describe_histogram!("product_price", "Distribution of product prices at write time");

    // User service
    describe_counter!("users_registered_total", "User accounts created");
    describe_counter!("logins_total", "Successful logins");
    describe_counter!("failed_logins_total", "Rejected login attempts");

    // Consumers (all services)
    describe_counter!("events_consumed_total", "Events processed by consumers");
    describe_counter!(
        "events_skipped_total",
        "Events skipped as duplicates or after handler errors"
    );
}
