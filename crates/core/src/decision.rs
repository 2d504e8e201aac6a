//! Decision record: the explainable trace produced for every ad request.

use crate::types::{FilterReasonCode, FilterResult, Score};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StageName {
    Request,
    Sourcing,
    Filters,
    Auction,
    Serve,
}

impl StageName {
    pub const ORDER: [StageName; 5] = [
        StageName::Request,
        StageName::Sourcing,
        StageName::Filters,
        StageName::Auction,
        StageName::Serve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Sourcing => "Sourcing",
            Self::Filters => "Filters",
            Self::Auction => "Auction",
            Self::Serve => "Serve",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStage {
    pub stage_name: StageName,
    pub latency_ms: f64,
    pub input_summary: String,
    pub output_summary: String,
    pub debug_payload: serde_json::Value,
}

/// One filter's verdict as recorded in the decision trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterTrace {
    pub filter: String,
    #[serde(flatten)]
    pub result: FilterResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub candidate_id: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub brand_name: String,
    pub creative_id: String,
    /// Filters evaluated for this candidate, in chain order, up to the first failure.
    pub filter_results: Vec<FilterTrace>,
    pub score: Score,
    pub passed_all_filters: bool,
}

impl ScoredCandidate {
    /// The reason code of the filter that dropped this candidate, if any.
    pub fn rejection(&self) -> Option<(&str, FilterReasonCode)> {
        self.filter_results
            .iter()
            .find(|t| !t.result.passed)
            .and_then(|t| t.result.reason_code.map(|code| (t.filter.as_str(), code)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingUrls {
    pub impression: String,
    /// 25%, 50%, 75%, 100%.
    pub quartiles: Vec<String>,
    pub complete: String,
    pub click: String,
}

impl TrackingUrls {
    pub fn for_decision(base_url: &str, decision_id: &str) -> Self {
        let base = format!("{}/{}", base_url.trim_end_matches('/'), decision_id);
        Self {
            impression: format!("{base}/impression"),
            quartiles: [25, 50, 75, 100]
                .iter()
                .map(|q| format!("{base}/quartile/{q}"))
                .collect(),
            complete: format!("{base}/complete"),
            click: format!("{base}/click"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServeInstruction {
    pub creative_id: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub brand_name: String,
    pub asset_url: String,
    pub duration_seconds: u32,
    pub tracking_urls: TrackingUrls,
    /// Second-price clearing CPM, in cents.
    pub price_paid: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Winner {
    pub candidate: ScoredCandidate,
    pub serve: ServeInstruction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub decision_id: String,
    pub request_id: String,
    pub seed: u64,
    pub timestamp: DateTime<Utc>,
    pub stages: Vec<PipelineStage>,
    /// Every sourced candidate exactly once, sorted by final score descending.
    pub candidates: Vec<ScoredCandidate>,
    pub winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_fill_reason: Option<String>,
}

impl Decision {
    pub fn is_fill(&self) -> bool {
        self.winner.is_some()
    }

    pub fn stage(&self, name: StageName) -> Option<&PipelineStage> {
        self.stages.iter().find(|s| s.stage_name == name)
    }
}
