//! Decision orchestrator: Request → Sourcing → Filters → Auction → Serve.
//!
//! Each call is a one-shot, synchronous computation over an immutable
//! catalog and blocklist. Nothing is retried and nothing is persisted; any
//! failure aborts the whole decision.

use crate::auction::AuctionScorer;
use crate::blocklist::Blocklist;
use crate::brand;
use crate::filters::{ChainOutcome, FilterChain};
use crate::sourcing::{CandidateSource, SourcingError};
use chrono::Utc;
use podads_core::config::DecisionConfig;
use podads_core::decision::{
    Decision, PipelineStage, ScoredCandidate, ServeInstruction, StageName, TrackingUrls, Winner,
};
use podads_core::types::{AdRequest, CandidateAd, Score};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

pub const NO_ELIGIBLE_CANDIDATES: &str = "No eligible candidates after filtering";
pub const ALL_SCORED_ZERO: &str = "All eligible candidates scored zero";

/// Hard ceiling on batch size; configuration can only lower it.
pub const MAX_BATCH_COUNT: usize = 1000;

#[derive(Error, Debug)]
pub enum DecisionError {
    #[error("candidate sourcing failed: {0}")]
    Sourcing(#[from] SourcingError),

    #[error("decision pipeline invariant violated: {0}")]
    Internal(String),
}

impl DecisionError {
    /// Stable classification label for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sourcing(_) => "sourcing_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn stage(&self) -> StageName {
        match self {
            Self::Sourcing(_) => StageName::Sourcing,
            Self::Internal(_) => StageName::Serve,
        }
    }
}

/// Aggregate of a batch run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub decisions: Vec<Decision>,
    pub count: usize,
    pub fills: usize,
    pub no_fills: usize,
    pub total_latency_ms: f64,
}

pub struct DecisionEngine {
    source: Arc<dyn CandidateSource>,
    chain: FilterChain,
    scorer: AuctionScorer,
    tracking_base_url: String,
    max_batch_count: usize,
}

impl DecisionEngine {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        blocklist: Arc<Blocklist>,
        config: &DecisionConfig,
    ) -> Self {
        Self::with_chain(source, FilterChain::standard(blocklist), config)
    }

    pub fn with_chain(
        source: Arc<dyn CandidateSource>,
        chain: FilterChain,
        config: &DecisionConfig,
    ) -> Self {
        Self {
            source,
            chain,
            scorer: AuctionScorer::new(),
            tracking_base_url: config.tracking_base_url.clone(),
            max_batch_count: config.max_batch_count.clamp(1, MAX_BATCH_COUNT),
        }
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.chain.names()
    }

    /// Produce one decision. Deterministic for a fixed request, catalog and
    /// seed, apart from the decision id and timestamps.
    pub fn execute(&self, request: &AdRequest, seed: u64) -> Result<Decision, DecisionError> {
        self.run(request, seed).inspect_err(|e| {
            metrics::counter!(
                "ad_errors_total",
                "error_type" => e.kind(),
                "stage" => e.stage().as_str()
            )
            .increment(1);
            error!(
                request_id = %request.request_id,
                seed,
                error_type = e.kind(),
                error = %e,
                "Ad decision failed"
            );
        })
    }

    /// Run `count` decisions (clamped to `[1, max_batch_count]`, where the
    /// configured maximum never exceeds [`MAX_BATCH_COUNT`]) with seeds
    /// `seed, seed + 1, ...` and request ids suffixed `-batch-{i}`.
    pub fn execute_batch(
        &self,
        request: &AdRequest,
        seed: u64,
        count: usize,
    ) -> Result<BatchOutcome, DecisionError> {
        let count = count.clamp(1, self.max_batch_count);
        let started = Instant::now();

        let decisions = (0..count)
            .map(|i| {
                let batch_request =
                    request.with_request_id(format!("{}-batch-{i}", request.request_id));
                self.execute(&batch_request, seed.wrapping_add(i as u64))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fills = decisions.iter().filter(|d| d.is_fill()).count();
        let total_latency_ms = elapsed_ms(started);

        info!(
            request_id = %request.request_id,
            count,
            fills,
            latency_ms = total_latency_ms,
            avg_latency_ms = total_latency_ms / count as f64,
            "Batch ad decision completed"
        );

        Ok(BatchOutcome {
            decisions,
            count,
            fills,
            no_fills: count - fills,
            total_latency_ms,
        })
    }

    fn run(&self, request: &AdRequest, seed: u64) -> Result<Decision, DecisionError> {
        let decision_started = Instant::now();
        let timestamp = Utc::now();
        let decision_id = format!("dec-{}-{}", timestamp.timestamp_millis(), seed);

        let category = request.podcast.category.as_str();
        let slot_type = request.slot.slot_type.as_str();

        info!(
            decision_id = %decision_id,
            request_id = %request.request_id,
            category,
            slot_type,
            "Ad decision started"
        );
        metrics::counter!(
            "ad_requests_total",
            "category" => category,
            "tier" => request.listener.tier.as_str()
        )
        .increment(1);

        let mut stages = Vec::with_capacity(StageName::ORDER.len());

        // Stage 1: Request
        let started = Instant::now();
        stages.push(finish_stage(
            StageName::Request,
            started,
            format!("{category} / {slot_type}"),
            format!("Request received for {}", request.podcast.show),
            json!({ "requestId": request.request_id }),
        ));

        // Stage 2: Sourcing
        let started = Instant::now();
        let sourced = self.source.load_candidates()?;
        let candidates = self
            .source
            .filter_by_category(sourced, request.podcast.category);
        metrics::histogram!("ad_candidates_processed").record(candidates.len() as f64);
        stages.push(finish_stage(
            StageName::Sourcing,
            started,
            format!("Category: {category}"),
            format!("Found {} candidate ads", candidates.len()),
            json!({ "candidateCount": candidates.len() }),
        ));

        // Stage 3: Filters
        let started = Instant::now();
        let outcomes: Vec<ChainOutcome> = candidates
            .iter()
            .map(|candidate| self.chain.evaluate(request, candidate, seed))
            .collect();
        let passed_count = outcomes.iter().filter(|o| o.passed).count();
        let dropped_count = candidates.len() - passed_count;

        let mut filter_failures: BTreeMap<&str, usize> = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| !o.passed) {
            if let Some(failed) = outcome.traces.last() {
                *filter_failures.entry(failed.filter.as_str()).or_default() += 1;
            }
        }
        stages.push(finish_stage(
            StageName::Filters,
            started,
            format!("{} candidates", candidates.len()),
            format!("{passed_count} passed, {dropped_count} dropped"),
            json!({
                "totalCandidates": candidates.len(),
                "passedCount": passed_count,
                "droppedCount": dropped_count,
                "filterFailures": filter_failures,
            }),
        ));

        // Stage 4: Auction
        let started = Instant::now();
        let ranked = self.rank(request, &candidates, outcomes);
        let winner_index = ranked
            .first()
            .filter(|(_, c)| c.score.final_score > 0.0)
            .map(|(idx, _)| *idx);
        let scored_count = ranked
            .iter()
            .filter(|(_, c)| c.score.final_score > 0.0)
            .count();
        let top = winner_index.and(ranked.first().map(|(_, c)| c));

        stages.push(finish_stage(
            StageName::Auction,
            started,
            format!("{passed_count} eligible candidates"),
            match top {
                Some(w) => format!(
                    "Winner: {} ({}) - score: {:.2}",
                    w.brand_name, w.campaign_id, w.score.final_score
                ),
                None => "No winner".to_string(),
            },
            json!({
                "scoredCount": scored_count,
                "topScore": top.map(|w| w.score.final_score),
            }),
        ));

        // Stage 5: Serve
        let started = Instant::now();
        let serve = match winner_index {
            Some(idx) => Some(self.serve_instruction(&decision_id, &candidates, idx, &ranked)?),
            None => None,
        };
        stages.push(finish_stage(
            StageName::Serve,
            started,
            match top {
                Some(w) => format!("Winner: {} ({})", w.brand_name, w.campaign_id),
                None => "No winner".to_string(),
            },
            match &serve {
                Some(s) => format!("Serving {} creative {}", s.brand_name, s.creative_id),
                None => "No fill".to_string(),
            },
            json!({
                "served": serve.is_some(),
                "pricePaid": serve.as_ref().map(|s| s.price_paid),
            }),
        ));

        let total_latency_ms = elapsed_ms(decision_started);
        metrics::histogram!("ad_decision_latency_ms").record(total_latency_ms);
        record_outcome(request, serve.as_ref());

        let winner = match serve {
            Some(serve) if !ranked.is_empty() => Some(Winner {
                candidate: ranked[0].1.clone(),
                serve,
            }),
            _ => None,
        };

        let no_fill_reason = winner.is_none().then(|| {
            if candidates.is_empty() {
                format!("No candidates sourced for category {category}")
            } else if passed_count == 0 {
                NO_ELIGIBLE_CANDIDATES.to_string()
            } else {
                ALL_SCORED_ZERO.to_string()
            }
        });

        info!(
            decision_id = %decision_id,
            outcome = if winner.is_some() { "fill" } else { "no_fill" },
            total_latency_ms,
            "Ad decision completed"
        );

        Ok(Decision {
            decision_id,
            request_id: request.request_id.clone(),
            seed,
            timestamp,
            stages,
            candidates: ranked.into_iter().map(|(_, c)| c).collect(),
            winner,
            no_fill_reason,
        })
    }

    /// Score passed candidates, append dropped ones with a zero score, and sort
    /// by final score descending. The sort is stable, so ties keep the
    /// passed-then-dropped encounter order. Each entry keeps its index into
    /// `candidates`.
    fn rank(
        &self,
        request: &AdRequest,
        candidates: &[CandidateAd],
        outcomes: Vec<ChainOutcome>,
    ) -> Vec<(usize, ScoredCandidate)> {
        let (passed, dropped): (Vec<_>, Vec<_>) = outcomes
            .into_iter()
            .enumerate()
            .partition(|(_, outcome)| outcome.passed);

        let mut ranked: Vec<(usize, ScoredCandidate)> = passed
            .into_iter()
            .chain(dropped)
            .map(|(idx, outcome)| {
                let candidate = &candidates[idx];
                let score = if outcome.passed {
                    self.scorer.score(request, candidate)
                } else {
                    Score::zero(candidate.campaign.bid_cpm_cents as f64)
                };
                (idx, scored_candidate(candidate, outcome, score))
            })
            .collect();

        ranked.sort_by(|(_, a), (_, b)| b.score.final_score.total_cmp(&a.score.final_score));
        ranked
    }

    fn serve_instruction(
        &self,
        decision_id: &str,
        candidates: &[CandidateAd],
        winner_index: usize,
        ranked: &[(usize, ScoredCandidate)],
    ) -> Result<ServeInstruction, DecisionError> {
        let winning = candidates.get(winner_index).ok_or_else(|| {
            DecisionError::Internal(format!("winner index {winner_index} out of range"))
        })?;
        let (_, top) = ranked
            .first()
            .ok_or_else(|| DecisionError::Internal("winner selected from empty ranking".into()))?;

        // Second price: the runner-up's bid if it also scored, else our own.
        let price_paid = ranked
            .get(1)
            .filter(|(_, runner_up)| runner_up.score.final_score > 0.0)
            .map(|(_, runner_up)| runner_up.score.bid_cpm)
            .unwrap_or(top.score.bid_cpm);

        Ok(ServeInstruction {
            creative_id: winning.creative.id.clone(),
            campaign_id: winning.campaign.id.clone(),
            campaign_name: winning.campaign.name.clone(),
            brand_name: top.brand_name.clone(),
            asset_url: winning.creative.asset_url.clone(),
            duration_seconds: winning.creative.duration_seconds,
            tracking_urls: TrackingUrls::for_decision(&self.tracking_base_url, decision_id),
            price_paid,
        })
    }
}

fn scored_candidate(candidate: &CandidateAd, outcome: ChainOutcome, score: Score) -> ScoredCandidate {
    let campaign = &candidate.campaign;
    ScoredCandidate {
        candidate_id: candidate.candidate_id(),
        campaign_id: campaign.id.clone(),
        campaign_name: campaign.name.clone(),
        brand_name: brand::brand_or(&campaign.name, &campaign.id),
        creative_id: candidate.creative.id.clone(),
        filter_results: outcome.traces,
        score,
        passed_all_filters: outcome.passed,
    }
}

fn finish_stage(
    stage: StageName,
    started: Instant,
    input_summary: String,
    output_summary: String,
    debug_payload: serde_json::Value,
) -> PipelineStage {
    let latency_ms = elapsed_ms(started);
    metrics::histogram!("ad_stage_latency_ms", "stage" => stage.as_str()).record(latency_ms);
    debug!(stage = stage.as_str(), latency_ms, output = %output_summary, "Stage completed");
    PipelineStage {
        stage_name: stage,
        latency_ms,
        input_summary,
        output_summary,
        debug_payload,
    }
}

fn record_outcome(request: &AdRequest, serve: Option<&ServeInstruction>) {
    let category = request.podcast.category.as_str();
    let slot_type = request.slot.slot_type.as_str();
    let outcome = if serve.is_some() { "fill" } else { "no_fill" };

    metrics::counter!(
        "ad_decisions_total",
        "outcome" => outcome,
        "category" => category,
        "slot_type" => slot_type
    )
    .increment(1);
    metrics::counter!("ad_slot_decisions_total", "slot_type" => slot_type, "outcome" => outcome)
        .increment(1);

    if let Some(serve) = serve {
        metrics::counter!(
            "ad_campaign_served_total",
            "campaign_id" => serve.campaign_id.clone(),
            "category" => category,
            "slot_type" => slot_type
        )
        .increment(1);
        metrics::counter!("ad_category_fills_total", "category" => category, "slot_type" => slot_type)
            .increment(1);
        // CPM cents per thousand impressions == millicents per impression.
        metrics::counter!(
            "ad_revenue_millicents_total",
            "category" => category,
            "slot_type" => slot_type
        )
        .increment(serve.price_paid.max(0.0).round() as u64);
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
