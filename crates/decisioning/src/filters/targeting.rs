//! Audience targeting checks. An absent or empty allow-list never rejects.

use super::Filter;
use podads_core::types::{
    allow_list_permits, AdRequest, CandidateAd, FilterReasonCode, FilterResult,
};

pub struct GeoTargetingFilter;

impl Filter for GeoTargetingFilter {
    fn name(&self) -> &'static str {
        "GeoTargetingFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let geo = &request.listener.geo;
        if allow_list_permits(&candidate.campaign.targeting.geo, geo) {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::GeoMismatch,
                format!("Listener geo {geo} not in targeting list"),
            )
        }
    }
}

pub struct DeviceTargetingFilter;

impl Filter for DeviceTargetingFilter {
    fn name(&self) -> &'static str {
        "DeviceTargetingFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let device = request.listener.device;
        if allow_list_permits(&candidate.campaign.targeting.device, &device) {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::DeviceMismatch,
                format!("Listener device {device} not in targeting list"),
            )
        }
    }
}

pub struct TierTargetingFilter;

impl Filter for TierTargetingFilter {
    fn name(&self) -> &'static str {
        "TierTargetingFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let tier = request.listener.tier;
        if allow_list_permits(&candidate.campaign.targeting.tier, &tier) {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::TierMismatch,
                format!("Listener tier {tier} not in targeting list"),
            )
        }
    }
}

pub struct CategoryMatchFilter;

impl Filter for CategoryMatchFilter {
    fn name(&self) -> &'static str {
        "CategoryMatchFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let category = request.podcast.category;
        if candidate.campaign.targeting.permits_category(category) {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::CategoryMismatch,
                format!("Podcast category {category} not in targeting list"),
            )
        }
    }
}

pub struct ExcludedCategoryFilter;

impl Filter for ExcludedCategoryFilter {
    fn name(&self) -> &'static str {
        "ExcludedCategoryFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let category = request.podcast.category;
        if candidate.campaign.targeting.excludes_category(category) {
            FilterResult::fail(
                FilterReasonCode::ExcludedCategory,
                format!("Podcast category {category} is excluded"),
            )
        } else {
            FilterResult::pass()
        }
    }
}
