use super::Filter;
use crate::blocklist::{BlockLevel, Blocklist};
use podads_core::types::{AdRequest, CandidateAd, FilterReasonCode, FilterResult};
use std::sync::Arc;
use tracing::info;

/// Rejects candidates whose campaign or creative is on the abusive-content blocklist.
pub struct AbusiveContentFilter {
    blocklist: Arc<Blocklist>,
}

impl AbusiveContentFilter {
    pub fn new(blocklist: Arc<Blocklist>) -> Self {
        Self { blocklist }
    }
}

impl Filter for AbusiveContentFilter {
    fn name(&self) -> &'static str {
        "AbusiveContentFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let campaign_id = candidate.campaign.id.as_str();
        let creative_id = candidate.creative.id.as_str();

        let Some(level) = self.blocklist.check(campaign_id, creative_id) else {
            return FilterResult::pass();
        };

        metrics::counter!("ad_blocklist_hits_total", "block_type" => level.as_str()).increment(1);

        let result = match level {
            BlockLevel::Campaign => {
                info!(campaign_id, filter = self.name(), "Blocking abusive campaign");
                FilterResult::fail(
                    FilterReasonCode::BrandSafetyViolation,
                    format!("Campaign blocked by brand safety filter: {campaign_id}"),
                )
            }
            BlockLevel::Creative => {
                info!(creative_id, filter = self.name(), "Blocking abusive creative");
                FilterResult::fail(
                    FilterReasonCode::BrandSafetyViolation,
                    format!("Creative blocked by brand safety filter: {creative_id}"),
                )
            }
        };
        result.with_metadata(serde_json::json!({ "blockType": level.as_str() }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_empty_blocklist_passes() {
        let filter = AbusiveContentFilter::new(Arc::new(Blocklist::empty()));
        assert!(filter.apply(&request(), &candidate(), 12345).passed);
    }

    #[test]
    fn test_campaign_reason_wins_when_both_blocked() {
        let blocklist = Blocklist::empty()
            .with_campaign("camp-test")
            .with_creative("cr-test");
        let filter = AbusiveContentFilter::new(Arc::new(blocklist));

        let result = filter.apply(&request(), &candidate(), 12345);
        assert!(!result.passed);
        assert_eq!(result.reason_code, Some(FilterReasonCode::BrandSafetyViolation));
        assert_eq!(
            result.details.as_deref(),
            Some("Campaign blocked by brand safety filter: camp-test")
        );
        assert_eq!(result.metadata.unwrap()["blockType"], "campaign");
    }

    #[test]
    fn test_creative_only_block() {
        let filter =
            AbusiveContentFilter::new(Arc::new(Blocklist::empty().with_creative("cr-test")));
        let result = filter.apply(&request(), &candidate(), 12345);
        assert_eq!(
            result.details.as_deref(),
            Some("Creative blocked by brand safety filter: cr-test")
        );
    }
}
