use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// ─── Request context enums ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum PodcastCategory {
    Fitness,
    Tech,
    Finance,
    TrueCrime,
    Sports,
    Comedy,
    News,
    Education,
}

impl PodcastCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Tech => "tech",
            Self::Finance => "finance",
            Self::TrueCrime => "true-crime",
            Self::Sports => "sports",
            Self::Comedy => "comedy",
            Self::News => "news",
            Self::Education => "education",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SlotType {
    PreRoll,
    MidRoll,
    PostRoll,
}

impl SlotType {
    pub const ALL: [SlotType; 3] = [SlotType::PreRoll, SlotType::MidRoll, SlotType::PostRoll];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreRoll => "pre-roll",
            Self::MidRoll => "mid-roll",
            Self::PostRoll => "post-roll",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceType {
    Mobile,
    Desktop,
    SmartSpeaker,
    Car,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::SmartSpeaker => "smart-speaker",
            Self::Car => "car",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TierType {
    Free,
    Premium,
}

impl TierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(PodcastCategory, SlotType, DeviceType, TierType);

// ─── Ad request ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodcastContext {
    pub category: PodcastCategory,
    pub show: String,
    pub episode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotContext {
    #[serde(rename = "type")]
    pub slot_type: SlotType,
    #[serde(default)]
    pub cue_point: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListenerContext {
    pub geo: String,
    pub device: DeviceType,
    pub tier: TierType,
    pub consent: bool,
    pub time_of_day: TimeOfDay,
}

/// A single ad request. Immutable once constructed; one per decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdRequest {
    pub request_id: String,
    pub podcast: PodcastContext,
    pub slot: SlotContext,
    pub listener: ListenerContext,
    pub timestamp: DateTime<Utc>,
}

impl AdRequest {
    /// Copy of this request under a different id. Used by batch mode.
    pub fn with_request_id(&self, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..self.clone()
        }
    }
}

// ─── Campaign catalog ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[serde(alias = "ACTIVE", alias = "Active")]
    Active,
    #[serde(alias = "PAUSED", alias = "Paused")]
    Paused,
    #[serde(alias = "ENDED", alias = "Ended")]
    Ended,
    #[serde(alias = "DRAFT", alias = "Draft")]
    Draft,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[serde(alias = "APPROVED", alias = "Approved")]
    Approved,
    #[serde(alias = "PENDING", alias = "Pending")]
    Pending,
    #[serde(alias = "REJECTED", alias = "Rejected")]
    Rejected,
}

/// Lifetime budget, in cents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Budget {
    #[serde(rename = "total", alias = "totalCents")]
    pub total_cents: i64,
    #[serde(rename = "remaining", alias = "remainingCents")]
    pub remaining_cents: i64,
}

/// Daily pacing, in cents. A missing daily budget means no pacing limit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pacing {
    #[serde(default, rename = "dailyBudget", alias = "dailyBudgetCents")]
    pub daily_budget_cents: Option<i64>,
    #[serde(default, rename = "dailySpend", alias = "dailySpendCents")]
    pub daily_spend_cents: Option<i64>,
}

impl Pacing {
    /// Fraction of today's budget already spent, or `None` when unpaced.
    pub fn spend_ratio(&self) -> Option<f64> {
        let budget = self.daily_budget_cents?;
        let spend = self.daily_spend_cents.unwrap_or(0);
        Some(spend as f64 / budget as f64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyCap {
    pub max_impressions: u32,
    pub window_hours: u32,
}

/// Allow/exclude lists. An absent or empty list matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetingRule {
    #[serde(default)]
    pub geo: Option<Vec<String>>,
    #[serde(default)]
    pub device: Option<Vec<DeviceType>>,
    #[serde(default)]
    pub tier: Option<Vec<TierType>>,
    #[serde(default)]
    pub categories: Option<Vec<PodcastCategory>>,
    #[serde(default)]
    pub shows: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_categories: Option<Vec<PodcastCategory>>,
}

/// Returns the list only when it actually restricts something.
pub fn restricting<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|l| !l.is_empty())
}

/// Allow-list semantics: absent or empty permits every value.
pub fn allow_list_permits<T: PartialEq>(list: &Option<Vec<T>>, value: &T) -> bool {
    restricting(list).map_or(true, |l| l.contains(value))
}

impl TargetingRule {
    pub fn permits_category(&self, category: PodcastCategory) -> bool {
        allow_list_permits(&self.categories, &category)
    }

    pub fn excludes_category(&self, category: PodcastCategory) -> bool {
        restricting(&self.exclude_categories).is_some_and(|l| l.contains(&category))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub advertiser_id: String,
    pub name: String,
    pub status: CampaignStatus,
    pub budget: Budget,
    #[serde(rename = "bidCpm", alias = "bidCpmCents")]
    pub bid_cpm_cents: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub targeting: TargetingRule,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub frequency_cap: Option<FrequencyCap>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    pub id: String,
    pub campaign_id: String,
    pub duration_seconds: u32,
    pub asset_url: String,
    pub approval_status: ApprovalStatus,
}

/// A (campaign, creative) pair under consideration for one request.
/// Catalog entries are shared, never copied per decision.
#[derive(Debug, Clone)]
pub struct CandidateAd {
    pub campaign: Arc<Campaign>,
    pub creative: Arc<Creative>,
    pub eligible_slot_types: Vec<SlotType>,
}

impl CandidateAd {
    pub fn new(
        campaign: Arc<Campaign>,
        creative: Arc<Creative>,
        eligible_slot_types: Vec<SlotType>,
    ) -> Self {
        Self {
            campaign,
            creative,
            eligible_slot_types,
        }
    }

    pub fn candidate_id(&self) -> String {
        format!("{}-{}", self.campaign.id, self.creative.id)
    }
}

// ─── Filter outcomes ────────────────────────────────────────────────────────

/// Enumerated cause of a filter rejection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterReasonCode {
    CampaignInactive,
    CampaignEnded,
    OutsideScheduleWindow,
    GeoMismatch,
    DeviceMismatch,
    TierMismatch,
    CategoryMismatch,
    ShowMismatch,
    ExcludedCategory,
    DurationTooLong,
    DurationTooShort,
    FrequencyCapExceeded,
    BudgetExhausted,
    PacingLimitExceeded,
    BrandSafetyViolation,
    CreativeNotApproved,
    SlotTypeMismatch,
}

impl FilterReasonCode {
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::CampaignInactive => "CAMPAIGN_INACTIVE",
            Self::CampaignEnded => "CAMPAIGN_ENDED",
            Self::OutsideScheduleWindow => "OUTSIDE_SCHEDULE_WINDOW",
            Self::GeoMismatch => "GEO_MISMATCH",
            Self::DeviceMismatch => "DEVICE_MISMATCH",
            Self::TierMismatch => "TIER_MISMATCH",
            Self::CategoryMismatch => "CATEGORY_MISMATCH",
            Self::ShowMismatch => "SHOW_MISMATCH",
            Self::ExcludedCategory => "EXCLUDED_CATEGORY",
            Self::DurationTooLong => "DURATION_TOO_LONG",
            Self::DurationTooShort => "DURATION_TOO_SHORT",
            Self::FrequencyCapExceeded => "FREQUENCY_CAP_EXCEEDED",
            Self::BudgetExhausted => "BUDGET_EXHAUSTED",
            Self::PacingLimitExceeded => "PACING_LIMIT_EXCEEDED",
            Self::BrandSafetyViolation => "BRAND_SAFETY_VIOLATION",
            Self::CreativeNotApproved => "CREATIVE_NOT_APPROVED",
            Self::SlotTypeMismatch => "SLOT_TYPE_MISMATCH",
        }
    }
}

impl fmt::Display for FilterReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Outcome of one filter applied to one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<FilterReasonCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl FilterResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason_code: None,
            details: None,
            metadata: None,
        }
    }

    pub fn fail(reason_code: FilterReasonCode, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason_code: Some(reason_code),
            details: Some(details.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ─── Auction score ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub category_match: f64,
    pub show_match: f64,
    pub listener_segment_weight: f64,
}

/// `final_score = bid_cpm * match_score * pacing_multiplier`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub bid_cpm: f64,
    pub match_score: f64,
    pub pacing_multiplier: f64,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl Score {
    /// Placeholder score attached to candidates that never reached the auction.
    pub fn zero(bid_cpm: f64) -> Self {
        Self {
            bid_cpm,
            match_score: 0.0,
            pacing_multiplier: 0.0,
            final_score: 0.0,
            breakdown: ScoreBreakdown {
                category_match: 0.0,
                show_match: 0.0,
                listener_segment_weight: 1.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PodcastCategory::TrueCrime).unwrap(),
            "\"true-crime\""
        );
        assert_eq!(
            serde_json::to_string(&DeviceType::SmartSpeaker).unwrap(),
            "\"smart-speaker\""
        );
        assert_eq!(serde_json::to_string(&SlotType::MidRoll).unwrap(), "\"mid-roll\"");
        assert_eq!(
            serde_json::to_string(&FilterReasonCode::PacingLimitExceeded).unwrap(),
            "\"pacing_limit_exceeded\""
        );
        assert_eq!(
            FilterReasonCode::PacingLimitExceeded.to_string(),
            "PACING_LIMIT_EXCEEDED"
        );
    }

    #[test]
    fn test_status_parsing_is_case_tolerant() {
        let upper: CampaignStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        let lower: CampaignStatus = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(upper, CampaignStatus::Active);
        assert_eq!(lower, CampaignStatus::Paused);
    }

    #[test]
    fn test_allow_list_semantics() {
        assert!(allow_list_permits::<String>(&None, &"US".to_string()));
        assert!(allow_list_permits(&Some(Vec::new()), &"US".to_string()));
        assert!(allow_list_permits(&Some(vec!["US".to_string()]), &"US".to_string()));
        assert!(!allow_list_permits(&Some(vec!["CA".to_string()]), &"US".to_string()));
    }

    #[test]
    fn test_excluded_category() {
        let rule = TargetingRule {
            exclude_categories: Some(vec![PodcastCategory::News]),
            ..Default::default()
        };
        assert!(rule.excludes_category(PodcastCategory::News));
        assert!(!rule.excludes_category(PodcastCategory::Tech));
        assert!(!TargetingRule::default().excludes_category(PodcastCategory::News));
    }

    #[test]
    fn test_spend_ratio() {
        let unpaced = Pacing::default();
        assert_eq!(unpaced.spend_ratio(), None);

        let half = Pacing {
            daily_budget_cents: Some(1000),
            daily_spend_cents: Some(500),
        };
        assert_eq!(half.spend_ratio(), Some(0.5));

        let no_spend = Pacing {
            daily_budget_cents: Some(1000),
            daily_spend_cents: None,
        };
        assert_eq!(no_spend.spend_ratio(), Some(0.0));
    }

    #[test]
    fn test_campaign_fixture_shape() {
        let json = r#"{
            "id": "camp-001",
            "advertiserId": "adv-001",
            "name": "Nike Air Max - Just Do It",
            "status": "active",
            "budget": {"total": 100000, "remaining": 50000},
            "bidCpm": 500,
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2030-12-31T23:59:59Z",
            "targeting": {"geo": ["US"], "categories": ["fitness"]},
            "pacing": {"dailyBudget": 10000, "dailySpend": 2000},
            "frequencyCap": {"maxImpressions": 3, "windowHours": 24}
        }"#;
        let campaign: Campaign = serde_json::from_str(json).unwrap();
        assert_eq!(campaign.bid_cpm_cents, 500);
        assert_eq!(campaign.budget.remaining_cents, 50000);
        assert_eq!(campaign.pacing.daily_budget_cents, Some(10000));
        assert!(campaign.targeting.permits_category(PodcastCategory::Fitness));
        assert!(!campaign.targeting.permits_category(PodcastCategory::Tech));
        assert_eq!(campaign.frequency_cap.map(|f| f.max_impressions), Some(3));
    }
}
