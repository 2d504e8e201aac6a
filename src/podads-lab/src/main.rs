//! Podads Lab: explainable podcast ad decisioning.
//!
//! Loads the campaign catalog and blocklist once, then serves decisions over
//! HTTP or runs a single decision from a request file.

use clap::Parser;
use podads_api::ApiServer;
use podads_core::config::{AppConfig, FixtureConfig};
use podads_core::types::AdRequest;
use podads_core::{PodAdsError, PodAdsResult};
use podads_decisioning::{Blocklist, DecisionEngine, FixtureCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "podads-lab")]
#[command(about = "Explainable ad decisioning for podcast inventory")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "PODADS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "PODADS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "PODADS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Directory holding campaigns.json, creatives.json and blocklist.json
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Run one decision for this request file, print it as JSON and exit
    #[arg(long, value_name = "REQUEST_JSON")]
    decide: Option<PathBuf>,

    /// Seed for --decide (defaults to the configured seed)
    #[arg(long)]
    seed: Option<u64>,
}

fn load_request(path: &Path) -> PodAdsResult<AdRequest> {
    let raw = std::fs::read_to_string(path)?;
    let request: AdRequest = serde_json::from_str(&raw)?;
    if request.request_id.trim().is_empty() {
        return Err(PodAdsError::Validation(
            "'requestId' must not be empty".to_string(),
        ));
    }
    Ok(request)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "podads_lab=info,podads_decisioning=info,podads_api=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(dir) = cli.fixtures {
        config.fixtures = FixtureConfig::in_dir(dir);
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        campaigns = %config.fixtures.campaigns_path.display(),
        "Configuration loaded"
    );

    // Campaign data is required; the blocklist fails open.
    let catalog = FixtureCatalog::load(&config.fixtures).map_err(|e| {
        error!(error = %e, "Failed to load campaign fixtures");
        PodAdsError::Fixture(e.to_string())
    })?;
    let blocklist = Blocklist::load_or_empty(&config.fixtures.blocklist_path);

    if catalog.is_empty() {
        warn!("Candidate catalog is empty, every decision will be a no-fill");
    }
    if blocklist.is_empty() {
        warn!("Blocklist is empty, abusive-content filtering is inactive");
    }

    info!(
        candidates = catalog.len(),
        blocked_campaigns = blocklist.campaign_count(),
        blocked_creatives = blocklist.creative_count(),
        "Catalog loaded"
    );

    let catalog_size = catalog.len();
    let engine = Arc::new(DecisionEngine::new(
        Arc::new(catalog),
        Arc::new(blocklist),
        &config.decision,
    ));

    if let Some(path) = cli.decide {
        let request = load_request(&path)?;
        let seed = cli.seed.unwrap_or(config.decision.default_seed);
        let decision = engine.execute(&request, seed)?;
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    let api_server = ApiServer::new(config.clone(), engine, catalog_size);

    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Podads Lab is ready to serve decisions");

    api_server.start_http().await?;

    Ok(())
}
