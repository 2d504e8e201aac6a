//! Budget, pacing, and frequency checks.
//!
//! None of these read live spend or impression ledgers. Budget and pacing
//! values are static catalog data, and contention or user-level capping is
//! simulated with a draw from a generator seeded by the pipeline seed.

use super::{seeded_draw, Filter};
use podads_core::types::{AdRequest, CandidateAd, FilterReasonCode, FilterResult};

/// Below this remaining budget (cents), concurrent reservations may exhaust it.
pub const LOW_BUDGET_THRESHOLD_CENTS: i64 = 10_000;
pub const RESERVATION_RACE_PROBABILITY: f64 = 0.01;

/// Above this daily spend ratio, requests are probabilistically throttled.
pub const PACING_THROTTLE_RATIO: f64 = 0.9;
pub const PACING_THROTTLE_PROBABILITY: f64 = 0.1;

pub const FREQUENCY_CAP_HIT_PROBABILITY: f64 = 0.01;

pub struct BudgetRemainingFilter;

impl Filter for BudgetRemainingFilter {
    fn name(&self) -> &'static str {
        "BudgetRemainingFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, seed: u64) -> FilterResult {
        let remaining = candidate.campaign.budget.remaining_cents;

        if remaining <= 0 {
            return FilterResult::fail(
                FilterReasonCode::BudgetExhausted,
                "Campaign budget exhausted",
            );
        }
        if remaining < LOW_BUDGET_THRESHOLD_CENTS
            && seeded_draw(seed) < RESERVATION_RACE_PROBABILITY
        {
            return FilterResult::fail(
                FilterReasonCode::BudgetExhausted,
                "Budget exhausted due to concurrent reservations",
            )
            .with_metadata(serde_json::json!({ "remainingCents": remaining }));
        }
        FilterResult::pass()
    }
}

pub struct PacingGateFilter;

impl Filter for PacingGateFilter {
    fn name(&self) -> &'static str {
        "PacingGateFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, seed: u64) -> FilterResult {
        let Some(ratio) = candidate.campaign.pacing.spend_ratio() else {
            return FilterResult::pass();
        };

        if ratio >= 1.0 {
            return FilterResult::fail(
                FilterReasonCode::PacingLimitExceeded,
                "Daily pacing limit exceeded",
            );
        }
        if ratio > PACING_THROTTLE_RATIO && seeded_draw(seed) < PACING_THROTTLE_PROBABILITY {
            return FilterResult::fail(
                FilterReasonCode::PacingLimitExceeded,
                "Pacing throttled to stay within daily budget",
            )
            .with_metadata(serde_json::json!({ "spendRatio": ratio }));
        }
        FilterResult::pass()
    }
}

/// Stand-in for a per-listener impression ledger: any configured cap is hit
/// with a small fixed probability.
pub struct FrequencyCapFilter;

impl Filter for FrequencyCapFilter {
    fn name(&self) -> &'static str {
        "FrequencyCapFilter"
    }

    fn apply(&self, _request: &AdRequest, candidate: &CandidateAd, seed: u64) -> FilterResult {
        let Some(cap) = candidate.campaign.frequency_cap else {
            return FilterResult::pass();
        };

        if seeded_draw(seed) < FREQUENCY_CAP_HIT_PROBABILITY {
            return FilterResult::fail(
                FilterReasonCode::FrequencyCapExceeded,
                format!(
                    "Frequency cap exceeded: {} impressions in {}h",
                    cap.max_impressions, cap.window_hours
                ),
            );
        }
        FilterResult::pass()
    }
}
