//! Abusive-content blocklist: campaign and creative ids merged from every
//! provenance source into two lookup sets. Built once, read-only afterwards.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum BlocklistError {
    #[error("failed to read blocklist {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed blocklist: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where a blocklist entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    CustomerReport,
    MlKeywordMatch,
    ManualCuration,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerReport => "customer_report",
            Self::MlKeywordMatch => "ml_keyword_match",
            Self::ManualCuration => "manual_curation",
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlocklistDocument {
    #[serde(default)]
    version: Option<String>,
    sources: BlocklistSources,
}

#[derive(Debug, Default, Deserialize)]
struct BlocklistSources {
    #[serde(default)]
    customer_reports: Option<BlocklistSource>,
    #[serde(default)]
    ml_keyword_match: Option<BlocklistSource>,
    #[serde(default)]
    manual_curation: Option<BlocklistSource>,
}

#[derive(Debug, Default, Deserialize)]
struct BlocklistSource {
    #[serde(default)]
    entries: Vec<BlocklistEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlocklistEntry {
    #[serde(default)]
    campaign_id: Option<String>,
    #[serde(default)]
    creative_id: Option<String>,
}

/// Which level of the candidate a blocklist hit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLevel {
    Campaign,
    Creative,
}

impl BlockLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::Creative => "creative",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    version: Option<String>,
    campaigns: HashSet<String>,
    creatives: HashSet<String>,
}

impl Blocklist {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from disk. Never fails: an unreadable or malformed source
    /// degrades to an empty blocklist.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(blocklist) => {
                info!(
                    path = %path.display(),
                    campaigns = blocklist.campaigns.len(),
                    creatives = blocklist.creatives.len(),
                    version = blocklist.version.as_deref().unwrap_or("unknown"),
                    "Blocklist loaded"
                );
                blocklist
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load blocklist, using empty blocklist"
                );
                Self::empty()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, BlocklistError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BlocklistError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, BlocklistError> {
        let doc: BlocklistDocument = serde_json::from_str(raw)?;
        let mut blocklist = Self {
            version: doc.version,
            ..Self::default()
        };

        let sources = [
            (doc.sources.customer_reports, Provenance::CustomerReport),
            (doc.sources.ml_keyword_match, Provenance::MlKeywordMatch),
            (doc.sources.manual_curation, Provenance::ManualCuration),
        ];
        for (source, provenance) in sources {
            if let Some(source) = source {
                blocklist.merge(source, provenance);
            }
        }
        Ok(blocklist)
    }

    fn merge(&mut self, source: BlocklistSource, provenance: Provenance) {
        for entry in source.entries {
            if let Some(id) = entry.campaign_id {
                debug!(campaign_id = %id, source = provenance.as_str(), "Blocklisted campaign");
                self.campaigns.insert(id);
            }
            if let Some(id) = entry.creative_id {
                debug!(creative_id = %id, source = provenance.as_str(), "Blocklisted creative");
                self.creatives.insert(id);
            }
        }
    }

    /// Builder used by tests and tools that assemble a list in code.
    pub fn with_campaign(mut self, campaign_id: impl Into<String>) -> Self {
        self.campaigns.insert(campaign_id.into());
        self
    }

    pub fn with_creative(mut self, creative_id: impl Into<String>) -> Self {
        self.creatives.insert(creative_id.into());
        self
    }

    /// Campaign-level blocks win over creative-level blocks.
    pub fn check(&self, campaign_id: &str, creative_id: &str) -> Option<BlockLevel> {
        if self.campaigns.contains(campaign_id) {
            Some(BlockLevel::Campaign)
        } else if self.creatives.contains(creative_id) {
            Some(BlockLevel::Creative)
        } else {
            None
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn campaign_count(&self) -> usize {
        self.campaigns.len()
    }

    pub fn creative_count(&self) -> usize {
        self.creatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty() && self.creatives.is_empty()
    }
}
