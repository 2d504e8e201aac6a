use crate::error::PodAdsResult;
use serde::Deserialize;
use std::path::PathBuf;

/// Root application configuration. Loaded from environment variables
/// with the prefix `PODADS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub fixtures: FixtureConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Locations of the static JSON collections read once at start-up.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    #[serde(default = "default_campaigns_path")]
    pub campaigns_path: PathBuf,
    #[serde(default = "default_creatives_path")]
    pub creatives_path: PathBuf,
    #[serde(default = "default_blocklist_path")]
    pub blocklist_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_seed")]
    pub default_seed: u64,
    #[serde(default = "default_batch_count")]
    pub default_batch_count: usize,
    #[serde(default = "default_max_batch_count")]
    pub max_batch_count: usize,
    #[serde(default = "default_tracking_base_url")]
    pub tracking_base_url: String,
}

// Default functions
fn default_node_id() -> String {
    "podads-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8000
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_campaigns_path() -> PathBuf {
    PathBuf::from("fixtures/campaigns.json")
}
fn default_creatives_path() -> PathBuf {
    PathBuf::from("fixtures/creatives.json")
}
fn default_blocklist_path() -> PathBuf {
    PathBuf::from("fixtures/blocklist.json")
}
fn default_seed() -> u64 {
    12345
}
fn default_batch_count() -> usize {
    100
}
fn default_max_batch_count() -> usize {
    1000
}
fn default_tracking_base_url() -> String {
    "https://tracking.podads.lab/events".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            campaigns_path: default_campaigns_path(),
            creatives_path: default_creatives_path(),
            blocklist_path: default_blocklist_path(),
        }
    }
}

impl FixtureConfig {
    /// Point all three fixture paths at files inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            campaigns_path: dir.join("campaigns.json"),
            creatives_path: dir.join("creatives.json"),
            blocklist_path: dir.join("blocklist.json"),
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            default_seed: default_seed(),
            default_batch_count: default_batch_count(),
            max_batch_count: default_max_batch_count(),
            tracking_base_url: default_tracking_base_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            fixtures: FixtureConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> PodAdsResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("PODADS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
