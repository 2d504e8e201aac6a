//! End-to-end decisions against the bundled fixture catalog and blocklist.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use podads_core::config::DecisionConfig;
    use podads_core::decision::StageName;
    use podads_core::types::*;
    use podads_decisioning::{Blocklist, DecisionEngine, FixtureCatalog};
    use std::sync::Arc;

    const CAMPAIGNS: &str = include_str!("../../../fixtures/campaigns.json");
    const CREATIVES: &str = include_str!("../../../fixtures/creatives.json");
    const BLOCKLIST: &str = include_str!("../../../fixtures/blocklist.json");

    fn engine() -> DecisionEngine {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        let blocklist = Blocklist::from_json(BLOCKLIST).unwrap();
        DecisionEngine::new(
            Arc::new(catalog),
            Arc::new(blocklist),
            &DecisionConfig::default(),
        )
    }

    fn request(category: PodcastCategory, show: &str, geo: &str) -> AdRequest {
        AdRequest {
            request_id: "req-flow-001".to_string(),
            podcast: PodcastContext {
                category,
                show: show.to_string(),
                episode: "ep-1".to_string(),
            },
            slot: SlotContext {
                slot_type: SlotType::MidRoll,
                cue_point: Some(900),
            },
            listener: ListenerContext {
                geo: geo.to_string(),
                device: DeviceType::Mobile,
                tier: TierType::Free,
                consent: true,
                time_of_day: TimeOfDay::Morning,
            },
            timestamp: Utc.with_ymd_and_hms(2025, 6, 15, 8, 30, 0).unwrap(),
        }
    }

    fn tech_request() -> AdRequest {
        request(PodcastCategory::Tech, "Hard Fork", "US")
    }

    #[test]
    fn test_fixture_catalog_loads() {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        assert_eq!(catalog.len(), 16);

        let blocklist = Blocklist::from_json(BLOCKLIST).unwrap();
        assert_eq!(blocklist.campaign_count(), 2);
        assert_eq!(blocklist.creative_count(), 2);
        assert_eq!(blocklist.version(), Some("2025-06-01"));
    }

    #[test]
    fn test_tech_mid_roll_fill() {
        let decision = engine().execute(&tech_request(), 12345).unwrap();

        let winner = decision.winner.as_ref().expect("tech request should fill");
        assert_eq!(winner.candidate.campaign_id, "camp-005");
        assert_eq!(winner.candidate.creative_id, "cr-005a");
        assert_eq!(winner.candidate.brand_name, "Coursera");
        assert_eq!(winner.candidate.score.final_score, 700.0);
        // Runner-up is Audible at 600.
        assert_eq!(winner.serve.price_paid, 600.0);
        assert_eq!(winner.serve.duration_seconds, 30);
        assert!(winner.candidate.passed_all_filters);
    }

    #[test]
    fn test_tech_candidates_ranked_then_dropped() {
        let decision = engine().execute(&tech_request(), 12345).unwrap();

        let ids: Vec<&str> = decision
            .candidates
            .iter()
            .map(|c| c.candidate_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "camp-005-cr-005a",
                "camp-003-cr-003",
                "camp-011-cr-011b",
                "camp-005-cr-005b",
                "camp-006-cr-006",
                "camp-008-cr-008",
                "camp-011-cr-011a",
                "camp-abuse-001-cr-abuse-001",
            ]
        );

        let reason = |id: &str| {
            decision
                .candidates
                .iter()
                .find(|c| c.candidate_id == id)
                .and_then(|c| c.rejection())
                .map(|(_, code)| code)
        };
        assert_eq!(reason("camp-005-cr-005b"), Some(FilterReasonCode::CreativeNotApproved));
        assert_eq!(reason("camp-006-cr-006"), Some(FilterReasonCode::CampaignInactive));
        assert_eq!(reason("camp-008-cr-008"), Some(FilterReasonCode::OutsideScheduleWindow));
        assert_eq!(reason("camp-011-cr-011a"), Some(FilterReasonCode::BrandSafetyViolation));
        assert_eq!(
            reason("camp-abuse-001-cr-abuse-001"),
            Some(FilterReasonCode::BrandSafetyViolation)
        );
    }

    #[test]
    fn test_filter_stage_counts_failures() {
        let decision = engine().execute(&tech_request(), 12345).unwrap();
        let filters = decision.stage(StageName::Filters).unwrap();

        assert_eq!(filters.output_summary, "3 passed, 5 dropped");
        let failures = &filters.debug_payload["filterFailures"];
        assert_eq!(failures["AbusiveContentFilter"], 2);
        assert_eq!(failures["CampaignStatusFilter"], 1);
        assert_eq!(failures["CreativeApprovalFilter"], 1);
        assert_eq!(failures["ScheduleWindowFilter"], 1);
    }

    #[test]
    fn test_everything_filtered_out() {
        let decision = engine()
            .execute(&request(PodcastCategory::Finance, "Planet Money", "BR"), 12345)
            .unwrap();

        assert!(decision.winner.is_none());
        assert_eq!(decision.candidates.len(), 6);
        assert!(decision.candidates.iter().all(|c| !c.passed_all_filters));
        assert_eq!(
            decision.no_fill_reason.as_deref(),
            Some("No eligible candidates after filtering")
        );
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let engine = engine();
        let premium = {
            let mut r = request(PodcastCategory::Fitness, "Huberman Lab", "US");
            r.listener.tier = TierType::Premium;
            r.listener.device = DeviceType::SmartSpeaker;
            r
        };

        for seed in [1, 42, 12345, 987_654_321] {
            let a = engine.execute(&premium, seed).unwrap();
            let b = engine.execute(&premium, seed).unwrap();
            let outcome = |d: &podads_core::decision::Decision| {
                d.candidates
                    .iter()
                    .map(|c| (c.candidate_id.clone(), c.passed_all_filters, c.score.final_score))
                    .collect::<Vec<_>>()
            };
            assert_eq!(outcome(&a), outcome(&b));
            assert_eq!(
                a.winner.map(|w| w.serve.price_paid),
                b.winner.map(|w| w.serve.price_paid)
            );
        }
    }

    #[test]
    fn test_decision_json_shape() {
        let decision = engine().execute(&tech_request(), 12345).unwrap();
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["requestId"], "req-flow-001");
        assert_eq!(json["seed"], 12345);
        assert_eq!(json["stages"].as_array().unwrap().len(), 5);
        assert_eq!(json["stages"][0]["stageName"], "Request");
        assert_eq!(json["winner"]["serve"]["pricePaid"], 600.0);
        assert!(json.get("noFillReason").is_none());
        assert_eq!(json["candidates"][0]["passedAllFilters"], true);
    }

    #[test]
    fn test_batch_over_fixtures() {
        let outcome = engine().execute_batch(&tech_request(), 500, 25).unwrap();
        assert_eq!(outcome.count, 25);
        assert_eq!(outcome.fills, 25);
        assert_eq!(outcome.no_fills, 0);
        assert_eq!(outcome.decisions[24].request_id, "req-flow-001-batch-24");
    }
}
