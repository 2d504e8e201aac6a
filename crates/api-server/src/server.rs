//! API server: decision endpoints over HTTP plus a Prometheus exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use podads_core::config::AppConfig;
use podads_decisioning::DecisionEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// All HTTP routes with their middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(rest::root))
        // Decision endpoints
        .route("/v1/decision", post(rest::handle_decision))
        .route("/v1/decision/batch", post(rest::handle_batch))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    engine: Arc<DecisionEngine>,
    catalog_size: usize,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<DecisionEngine>, catalog_size: usize) -> Self {
        Self {
            config,
            engine,
            catalog_size,
        }
    }

    /// Start the HTTP server. Runs until the listener fails.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            engine: self.engine.clone(),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
            catalog_size: self.catalog_size,
            default_seed: self.config.decision.default_seed,
            default_batch_count: self.config.decision.default_batch_count,
        };

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router(state)).await?;

        Ok(())
    }

    /// Install the global metrics recorder and serve it on the metrics port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        if !self.config.metrics.enabled {
            info!("Metrics exporter disabled");
            return Ok(());
        }

        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
