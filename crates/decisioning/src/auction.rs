//! Auction scoring for candidates that survived the filter chain.

use podads_core::types::{
    restricting, AdRequest, CandidateAd, DeviceType, Score, ScoreBreakdown, TierType,
};

const CATEGORY_MATCH: f64 = 1.0;
const CATEGORY_MISS: f64 = 0.3;
const SHOW_MATCH: f64 = 1.0;
const SHOW_MISS: f64 = 0.4;
/// Score for a dimension the campaign does not target at all.
const NEUTRAL: f64 = 0.5;

const PREMIUM_TIER_WEIGHT: f64 = 1.1;
const SMART_SPEAKER_WEIGHT: f64 = 1.05;

const CATEGORY_SHARE: f64 = 0.6;
const SHOW_SHARE: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuctionScorer;

impl AuctionScorer {
    pub fn new() -> Self {
        Self
    }

    /// Relevance components of a candidate for this request.
    pub fn match_breakdown(&self, request: &AdRequest, candidate: &CandidateAd) -> ScoreBreakdown {
        let targeting = &candidate.campaign.targeting;

        let category_match = match restricting(&targeting.categories) {
            Some(list) if list.contains(&request.podcast.category) => CATEGORY_MATCH,
            Some(_) => CATEGORY_MISS,
            None => NEUTRAL,
        };

        let show_match = match restricting(&targeting.shows) {
            Some(list) if list.contains(&request.podcast.show) => SHOW_MATCH,
            Some(_) => SHOW_MISS,
            None => NEUTRAL,
        };

        let mut listener_segment_weight = 1.0;
        if request.listener.tier == TierType::Premium {
            listener_segment_weight *= PREMIUM_TIER_WEIGHT;
        }
        if request.listener.device == DeviceType::SmartSpeaker {
            listener_segment_weight *= SMART_SPEAKER_WEIGHT;
        }

        ScoreBreakdown {
            category_match,
            show_match,
            listener_segment_weight,
        }
    }

    /// Weighted relevance; the listener weight only scales the show component.
    pub fn match_score(&self, request: &AdRequest, candidate: &CandidateAd) -> f64 {
        combine(&self.match_breakdown(request, candidate))
    }

    /// Throttles the score as today's spend approaches the daily budget.
    pub fn pacing_multiplier(&self, candidate: &CandidateAd) -> f64 {
        match candidate.campaign.pacing.spend_ratio() {
            None => 1.0,
            Some(r) if r >= 1.0 => 0.0,
            Some(r) if r > 0.9 => 0.3,
            Some(r) if r > 0.7 => 0.7,
            Some(_) => 1.0,
        }
    }

    pub fn score(&self, request: &AdRequest, candidate: &CandidateAd) -> Score {
        let bid_cpm = candidate.campaign.bid_cpm_cents as f64;
        let breakdown = self.match_breakdown(request, candidate);
        let match_score = combine(&breakdown);
        let pacing_multiplier = self.pacing_multiplier(candidate);

        Score {
            bid_cpm,
            match_score,
            pacing_multiplier,
            final_score: bid_cpm * match_score * pacing_multiplier,
            breakdown,
        }
    }
}

fn combine(b: &ScoreBreakdown) -> f64 {
    b.category_match * CATEGORY_SHARE + b.show_match * SHOW_SHARE * b.listener_segment_weight
}
