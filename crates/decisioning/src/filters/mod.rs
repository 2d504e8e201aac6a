//! Eligibility filter chain.
//!
//! Filters run in a fixed order and a candidate stops at its first failure, so
//! the order decides which reason code is reported for a dropped candidate.

pub mod brand_safety;
pub mod delivery;
pub mod eligibility;
pub mod targeting;

pub use brand_safety::AbusiveContentFilter;
pub use delivery::{BudgetRemainingFilter, FrequencyCapFilter, PacingGateFilter};
pub use eligibility::{
    CampaignStatusFilter, CreativeApprovalFilter, ScheduleWindowFilter, SlotTypeFilter,
};
pub use targeting::{
    CategoryMatchFilter, DeviceTargetingFilter, ExcludedCategoryFilter, GeoTargetingFilter,
    TierTargetingFilter,
};

use crate::blocklist::Blocklist;
use podads_core::decision::FilterTrace;
use podads_core::types::{AdRequest, CandidateAd, FilterResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// A single eligibility check over one candidate for one request.
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, seed: u64) -> FilterResult;
}

/// First value drawn from a generator seeded with the raw pipeline seed.
///
/// Every probabilistic filter builds its own generator from the same seed, so
/// their draws for a given seed are identical rather than independent.
pub(crate) fn seeded_draw(seed: u64) -> f64 {
    StdRng::seed_from_u64(seed).gen::<f64>()
}

/// Per-candidate result of running the chain.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub traces: Vec<FilterTrace>,
    pub passed: bool,
}

pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// The production chain.
    pub fn standard(blocklist: Arc<Blocklist>) -> Self {
        Self::new(vec![
            Box::new(CampaignStatusFilter),
            Box::new(AbusiveContentFilter::new(blocklist)),
            Box::new(ScheduleWindowFilter),
            Box::new(SlotTypeFilter),
            Box::new(CreativeApprovalFilter),
            Box::new(GeoTargetingFilter),
            Box::new(DeviceTargetingFilter),
            Box::new(TierTargetingFilter),
            Box::new(CategoryMatchFilter),
            Box::new(ExcludedCategoryFilter),
            Box::new(BudgetRemainingFilter),
            Box::new(PacingGateFilter),
            Box::new(FrequencyCapFilter),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run filters in order, stopping at the first failure.
    pub fn evaluate(&self, request: &AdRequest, candidate: &CandidateAd, seed: u64) -> ChainOutcome {
        let mut traces = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            let result = filter.apply(request, candidate, seed);
            let passed = result.passed;

            metrics::counter!(
                "ad_filters_applied",
                "filter_name" => filter.name(),
                "passed" => if passed { "true" } else { "false" }
            )
            .increment(1);

            traces.push(FilterTrace {
                filter: filter.name().to_string(),
                result,
            });

            if !passed {
                return ChainOutcome {
                    traces,
                    passed: false,
                };
            }
        }

        ChainOutcome {
            traces,
            passed: true,
        }
    }
}
