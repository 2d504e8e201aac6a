//! Campaign lifecycle and creative eligibility checks.

use super::Filter;
use podads_core::types::{
    AdRequest, ApprovalStatus, CampaignStatus, CandidateAd, FilterReasonCode, FilterResult,
};

/// Only `Active` campaigns may serve.
pub struct CampaignStatusFilter;

impl Filter for CampaignStatusFilter {
    fn name(&self) -> &'static str {
        "CampaignStatusFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let status = candidate.campaign.status;
        match status {
            CampaignStatus::Active => FilterResult::pass(),
            CampaignStatus::Ended => FilterResult::fail(
                FilterReasonCode::CampaignEnded,
                format!("Campaign status is {status:?}"),
            ),
            CampaignStatus::Paused | CampaignStatus::Draft => FilterResult::fail(
                FilterReasonCode::CampaignInactive,
                format!("Campaign status is {status:?}"),
            ),
        }
    }
}

/// Request timestamp must fall inside `[start_date, end_date]`.
pub struct ScheduleWindowFilter;

impl Filter for ScheduleWindowFilter {
    fn name(&self) -> &'static str {
        "ScheduleWindowFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let now = request.timestamp;
        let campaign = &candidate.campaign;

        if now < campaign.start_date {
            return FilterResult::fail(
                FilterReasonCode::OutsideScheduleWindow,
                format!("Campaign starts on {}", campaign.start_date.to_rfc3339()),
            );
        }
        if now > campaign.end_date {
            return FilterResult::fail(
                FilterReasonCode::OutsideScheduleWindow,
                format!("Campaign ended on {}", campaign.end_date.to_rfc3339()),
            );
        }
        FilterResult::pass()
    }
}

pub struct SlotTypeFilter;

impl Filter for SlotTypeFilter {
    fn name(&self) -> &'static str {
        "SlotTypeFilter"
    }

    fn apply(&self, request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let slot = request.slot.slot_type;
        if candidate.eligible_slot_types.contains(&slot) {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::SlotTypeMismatch,
                format!("Slot type {slot} not eligible for this creative"),
            )
        }
    }
}

pub struct CreativeApprovalFilter;

impl Filter for CreativeApprovalFilter {
    fn name(&self) -> &'static str {
        "CreativeApprovalFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, _seed: u64) -> FilterResult {
        let status = candidate.creative.approval_status;
        if status == ApprovalStatus::Approved {
            FilterResult::pass()
        } else {
            FilterResult::fail(
                FilterReasonCode::CreativeNotApproved,
                format!("Creative status is {status:?}"),
            )
        }
    }
}
