//! Candidate sourcing: joins the campaign and creative collections into
//! (campaign, creative) pairs and narrows them by podcast category.

use podads_core::config::FixtureConfig;
use podads_core::types::{Campaign, CandidateAd, Creative, PodcastCategory, SlotType};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SourcingError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse fixture {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Supplies every (campaign, creative) pair eligible for sourcing.
pub trait CandidateSource: Send + Sync {
    fn load_candidates(&self) -> Result<Vec<CandidateAd>, SourcingError>;

    /// Keep candidates whose campaign category targeting admits `category`.
    /// Campaigns without category targeting are always kept.
    fn filter_by_category(
        &self,
        candidates: Vec<CandidateAd>,
        category: PodcastCategory,
    ) -> Vec<CandidateAd> {
        candidates
            .into_iter()
            .filter(|c| c.campaign.targeting.permits_category(category))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct CampaignsDocument {
    campaigns: Vec<Campaign>,
}

#[derive(Debug, Deserialize)]
struct CreativesDocument {
    creatives: Vec<CreativeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreativeRecord {
    #[serde(flatten)]
    creative: Creative,
    #[serde(default)]
    eligible_slot_types: Option<Vec<SlotType>>,
}

/// Immutable in-memory catalog built from the JSON fixtures.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    candidates: Vec<CandidateAd>,
    campaign_count: usize,
    creative_count: usize,
}

impl FixtureCatalog {
    pub fn load(config: &FixtureConfig) -> Result<Self, SourcingError> {
        let campaigns_raw = read_fixture(&config.campaigns_path)?;
        let creatives_raw = read_fixture(&config.creatives_path)?;

        let campaigns: CampaignsDocument =
            serde_json::from_str(&campaigns_raw).map_err(|source| SourcingError::Parse {
                path: config.campaigns_path.display().to_string(),
                source,
            })?;
        let creatives: CreativesDocument =
            serde_json::from_str(&creatives_raw).map_err(|source| SourcingError::Parse {
                path: config.creatives_path.display().to_string(),
                source,
            })?;

        let catalog = Self::build(campaigns.campaigns, creatives.creatives);
        info!(
            campaigns = catalog.campaign_count,
            creatives = catalog.creative_count,
            candidates = catalog.candidates.len(),
            "Candidate catalog loaded"
        );
        Ok(catalog)
    }

    /// Build from raw `{"campaigns": [...]}` and `{"creatives": [...]}` documents.
    pub fn from_json(campaigns: &str, creatives: &str) -> Result<Self, SourcingError> {
        let campaigns: CampaignsDocument =
            serde_json::from_str(campaigns).map_err(|source| SourcingError::Parse {
                path: "<campaigns>".to_string(),
                source,
            })?;
        let creatives: CreativesDocument =
            serde_json::from_str(creatives).map_err(|source| SourcingError::Parse {
                path: "<creatives>".to_string(),
                source,
            })?;
        Ok(Self::build(campaigns.campaigns, creatives.creatives))
    }

    pub fn from_candidates(candidates: Vec<CandidateAd>) -> Self {
        let distinct = |id: fn(&CandidateAd) -> &str| {
            candidates.iter().map(id).collect::<HashSet<_>>().len()
        };
        let campaign_count = distinct(|c| c.campaign.id.as_str());
        let creative_count = distinct(|c| c.creative.id.as_str());
        Self {
            candidates,
            campaign_count,
            creative_count,
        }
    }

    fn build(campaigns: Vec<Campaign>, creatives: Vec<CreativeRecord>) -> Self {
        let campaign_count = campaigns.len();
        let creative_count = creatives.len();
        let creatives: Vec<(Arc<Creative>, Vec<SlotType>)> = creatives
            .into_iter()
            .map(|record| {
                let slots = record
                    .eligible_slot_types
                    .unwrap_or_else(|| SlotType::ALL.to_vec());
                (Arc::new(record.creative), slots)
            })
            .collect();

        // Campaign order first, then creative order within each campaign.
        let mut candidates = Vec::new();
        for campaign in campaigns.into_iter().map(Arc::new) {
            for (creative, slots) in creatives
                .iter()
                .filter(|(creative, _)| creative.campaign_id == campaign.id)
            {
                candidates.push(CandidateAd::new(
                    campaign.clone(),
                    creative.clone(),
                    slots.clone(),
                ));
            }
        }

        Self {
            candidates,
            campaign_count,
            creative_count,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl CandidateSource for FixtureCatalog {
    fn load_candidates(&self) -> Result<Vec<CandidateAd>, SourcingError> {
        Ok(self.candidates.clone())
    }
}

fn read_fixture(path: &Path) -> Result<String, SourcingError> {
    std::fs::read_to_string(path).map_err(|source| SourcingError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMPAIGNS: &str = r#"{"campaigns": [
        {
            "id": "camp-fit", "advertiserId": "adv-1", "name": "Peloton Bike+",
            "status": "active", "budget": {"total": 100000, "remaining": 80000},
            "bidCpm": 450, "startDate": "2024-01-01T00:00:00Z", "endDate": "2030-01-01T00:00:00Z",
            "targeting": {"categories": ["fitness", "sports"]}, "pacing": {}
        },
        {
            "id": "camp-any", "advertiserId": "adv-2", "name": "Audible Originals",
            "status": "active", "budget": {"total": 100000, "remaining": 80000},
            "bidCpm": 300, "startDate": "2024-01-01T00:00:00Z", "endDate": "2030-01-01T00:00:00Z",
            "targeting": {}, "pacing": {"dailyBudget": 5000, "dailySpend": 100}
        }
    ]}"#;

    const CREATIVES: &str = r#"{"creatives": [
        {"id": "cr-1", "campaignId": "camp-fit", "durationSeconds": 30,
         "assetUrl": "https://cdn.example/cr-1.mp3", "approvalStatus": "approved",
         "eligibleSlotTypes": ["pre-roll"]},
        {"id": "cr-2", "campaignId": "camp-any", "durationSeconds": 15,
         "assetUrl": "https://cdn.example/cr-2.mp3", "approvalStatus": "approved"},
        {"id": "cr-3", "campaignId": "camp-fit", "durationSeconds": 60,
         "assetUrl": "https://cdn.example/cr-3.mp3", "approvalStatus": "pending"},
        {"id": "cr-orphan", "campaignId": "camp-missing", "durationSeconds": 30,
         "assetUrl": "https://cdn.example/orphan.mp3", "approvalStatus": "approved"}
    ]}"#;

    #[test]
    fn test_join_on_campaign_id() {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        let ids: Vec<String> = catalog
            .load_candidates()
            .unwrap()
            .iter()
            .map(|c| c.candidate_id())
            .collect();
        assert_eq!(ids, vec!["camp-fit-cr-1", "camp-fit-cr-3", "camp-any-cr-2"]);
    }

    #[test]
    fn test_slot_types_default_to_all() {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        let candidates = catalog.load_candidates().unwrap();
        assert_eq!(candidates[0].eligible_slot_types, vec![SlotType::PreRoll]);
        assert_eq!(candidates[2].eligible_slot_types, SlotType::ALL.to_vec());
    }

    #[test]
    fn test_filter_by_category_keeps_untargeted() {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        let candidates = catalog.load_candidates().unwrap();

        let tech = catalog.filter_by_category(candidates.clone(), PodcastCategory::Tech);
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].campaign.id, "camp-any");

        let sports = catalog.filter_by_category(candidates, PodcastCategory::Sports);
        assert_eq!(sports.len(), 3);
    }

    #[test]
    fn test_missing_fixture_is_an_error() {
        let config = FixtureConfig::in_dir("/nonexistent");
        assert!(matches!(
            FixtureCatalog::load(&config),
            Err(SourcingError::Read { .. })
        ));
    }
}
