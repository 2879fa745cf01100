#![deny(warnings)]

//! Core domain models and invariants for adlab.
//!
//! This crate defines the serializable campaign configuration, simulated
//! metric records and experiment definitions shared across the workspace,
//! with validation helpers to guarantee basic invariants.

mod experiment;
mod metrics;

pub use experiment::*;
pub use metrics::*;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Advertising platform a campaign runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Google Ads search network.
    Google,
    /// Meta (Facebook / Instagram) ads.
    Meta,
    /// LinkedIn sponsored content.
    #[serde(rename = "linkedin", alias = "linked_in")]
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Google, Platform::Meta, Platform::LinkedIn];

    /// Maximum headline length in characters.
    pub fn headline_limit(self) -> usize {
        match self {
            Platform::Google => 30,
            Platform::Meta => 40,
            Platform::LinkedIn => 70,
        }
    }

    /// Maximum description length in characters.
    pub fn description_limit(self) -> usize {
        match self {
            Platform::Google => 90,
            Platform::Meta => 125,
            Platform::LinkedIn => 150,
        }
    }

    /// Number of headlines the platform expects for a complete ad.
    pub fn recommended_headlines(self) -> usize {
        match self {
            Platform::Google => 3,
            Platform::Meta | Platform::LinkedIn => 1,
        }
    }

    /// Whether delivery is driven by search keywords rather than audiences.
    pub fn keyword_driven(self) -> bool {
        matches!(self, Platform::Google)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Google => "google",
            Platform::Meta => "meta",
            Platform::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Industry vertical; selects benchmark and seasonality tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Ecommerce,
    Saas,
    Finance,
    Healthcare,
    Education,
    Travel,
    RealEstate,
    Other,
}

impl Industry {
    pub const ALL: [Industry; 8] = [
        Industry::Ecommerce,
        Industry::Saas,
        Industry::Finance,
        Industry::Healthcare,
        Industry::Education,
        Industry::Travel,
        Industry::RealEstate,
        Industry::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Industry::Ecommerce => "ecommerce",
            Industry::Saas => "saas",
            Industry::Finance => "finance",
            Industry::Healthcare => "healthcare",
            Industry::Education => "education",
            Industry::Travel => "travel",
            Industry::RealEstate => "real_estate",
            Industry::Other => "other",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignGoal {
    Awareness,
    Traffic,
    Engagement,
    Leads,
    Conversions,
}

/// Device class an ad can be served on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Desktop, Device::Mobile, Device::Tablet];
}

/// Keyword match type for search campaigns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Phrase,
    Broad,
}

/// A search keyword with its match type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,
}

fn default_match_type() -> MatchType {
    MatchType::Broad
}

/// How the platform is allowed to bid on the advertiser's behalf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BidStrategy {
    /// Fixed maximum cost per click in USD.
    ManualCpc { max_cpc: Decimal },
    MaximizeClicks,
    MaximizeConversions,
    /// Automated bidding towards a cost per acquisition in USD.
    TargetCpa { target_cpa: Decimal },
}

impl Default for BidStrategy {
    fn default() -> Self {
        BidStrategy::MaximizeClicks
    }
}

/// Hours of the day during which ads are eligible, `[start_hour, end_hour)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSchedule {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl AdSchedule {
    /// Whether the given hour (0..24) is inside the schedule.
    pub fn is_active(&self, hour: u8) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// Audience definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targeting {
    /// Geographic targets; empty means the whole market.
    pub locations: Vec<String>,
    pub age_min: u8,
    pub age_max: u8,
    /// Interest categories (Meta / LinkedIn).
    pub interests: Vec<String>,
    /// Job titles (LinkedIn).
    pub job_titles: Vec<String>,
    /// Targeted devices; empty means all devices.
    pub devices: Vec<Device>,
}

impl Default for Targeting {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            age_min: 18,
            age_max: 65,
            interests: Vec::new(),
            job_titles: Vec::new(),
            devices: Vec::new(),
        }
    }
}

impl Targeting {
    /// Whether ads are served on `device`.
    pub fn targets(&self, device: Device) -> bool {
        self.devices.is_empty() || self.devices.contains(&device)
    }

    /// Devices the campaign is eligible on, in canonical order.
    pub fn targeted_devices(&self) -> Vec<Device> {
        Device::ALL
            .into_iter()
            .filter(|d| self.targets(*d))
            .collect()
    }
}

/// Creative text for an ad.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdCopy {
    pub headlines: Vec<String>,
    pub descriptions: Vec<String>,
    pub call_to_action: Option<String>,
    pub display_url: Option<String>,
}

/// A campaign configuration, the input of every simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub name: String,
    pub platform: Platform,
    pub industry: Industry,
    pub goal: CampaignGoal,
    /// Daily budget in USD (> 0).
    pub daily_budget: Decimal,
    #[serde(default)]
    pub bid_strategy: BidStrategy,
    pub start_date: NaiveDate,
    /// Number of simulated days (1..=365).
    pub duration_days: u16,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    pub ad_copy: AdCopy,
    #[serde(default)]
    pub schedule: Option<AdSchedule>,
    /// Revenue attributed to one conversion in USD, when known.
    #[serde(default)]
    pub conversion_value: Option<Decimal>,
}

impl Campaign {
    /// Calendar date of the zero-based simulation day.
    pub fn date_for_day(&self, day_index: u16) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(day_index)))
            .unwrap_or(self.start_date)
    }

    /// Budget over the whole flight.
    pub fn total_budget(&self) -> Decimal {
        self.daily_budget * Decimal::from(self.duration_days)
    }
}

/// Simulation configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
    /// Half-width of the multiplicative noise band applied per metric, in [0, 1).
    pub noise_frac: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            noise_frac: 0.15,
        }
    }
}

/// Smallest billable click price, one cent.
pub const MIN_BID: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("daily budget must be > 0")]
    NonPositiveBudget,
    #[error("duration of {0} days is outside [1, 365]")]
    DurationOutOfRange(u16),
    #[error("ad copy needs at least one non-empty headline")]
    MissingHeadline,
    #[error("keyword text must not be empty")]
    EmptyKeyword,
    #[error("bid amount must be > 0")]
    NonPositiveBid,
    #[error("manual CPC bid must be at least $0.01")]
    BidBelowMinimum,
    #[error("age range {0}-{1} is invalid (13 <= min <= max <= 65)")]
    AgeRange(u8, u8),
    #[error("targeting entries must not be empty")]
    EmptyTargetingEntry,
    #[error("schedule hours {0}-{1} are invalid")]
    InvalidSchedule(u8, u8),
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    #[error("noise fraction must be finite and within [0, 1)")]
    NoiseOutOfRange,
    #[error("invalid A/B test: {0}")]
    AbTestShape(String),
}

/// Validate an audience definition.
pub fn validate_targeting(t: &Targeting) -> Result<(), ValidationError> {
    if t.age_min < 13 || t.age_max > 65 || t.age_min > t.age_max {
        return Err(ValidationError::AgeRange(t.age_min, t.age_max));
    }
    let entries = t.locations.iter().chain(&t.interests).chain(&t.job_titles);
    for e in entries {
        if e.trim().is_empty() {
            return Err(ValidationError::EmptyTargetingEntry);
        }
    }
    Ok(())
}

/// Validate an ad schedule.
pub fn validate_schedule(s: &AdSchedule) -> Result<(), ValidationError> {
    if s.start_hour >= s.end_hour || s.end_hour > 24 {
        return Err(ValidationError::InvalidSchedule(s.start_hour, s.end_hour));
    }
    Ok(())
}

/// Validate a bid strategy.
pub fn validate_bid_strategy(b: &BidStrategy) -> Result<(), ValidationError> {
    match b {
        BidStrategy::ManualCpc { max_cpc: amount }
        | BidStrategy::TargetCpa { target_cpa: amount } => {
            if *amount <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveBid);
            }
        }
        BidStrategy::MaximizeClicks | BidStrategy::MaximizeConversions => {}
    }
    if let BidStrategy::ManualCpc { max_cpc } = b {
        if *max_cpc < MIN_BID {
            return Err(ValidationError::BidBelowMinimum);
        }
    }
    Ok(())
}

/// Validate a campaign, including its targeting, schedule and creative.
pub fn validate_campaign(c: &Campaign) -> Result<(), ValidationError> {
    if c.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if c.daily_budget <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveBudget);
    }
    if !(1..=365).contains(&c.duration_days) {
        return Err(ValidationError::DurationOutOfRange(c.duration_days));
    }
    if !c.ad_copy.headlines.iter().any(|h| !h.trim().is_empty()) {
        return Err(ValidationError::MissingHeadline);
    }
    if c.keywords.iter().any(|k| k.text.trim().is_empty()) {
        return Err(ValidationError::EmptyKeyword);
    }
    validate_bid_strategy(&c.bid_strategy)?;
    validate_targeting(&c.targeting)?;
    if let Some(s) = &c.schedule {
        validate_schedule(s)?;
    }
    if matches!(c.conversion_value, Some(v) if v < Decimal::ZERO) {
        return Err(ValidationError::NegativeMoney);
    }
    Ok(())
}

/// Validate simulation parameters.
pub fn validate_sim_config(cfg: &SimConfig) -> Result<(), ValidationError> {
    if !cfg.noise_frac.is_finite() || !(0.0..1.0).contains(&cfg.noise_frac) {
        return Err(ValidationError::NoiseOutOfRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn campaign() -> Campaign {
        Campaign {
            name: "Spring Sale".to_string(),
            platform: Platform::Google,
            industry: Industry::Ecommerce,
            goal: CampaignGoal::Conversions,
            daily_budget: Decimal::new(5000, 2),
            bid_strategy: BidStrategy::ManualCpc {
                max_cpc: Decimal::new(150, 2),
            },
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            duration_days: 30,
            targeting: Targeting::default(),
            keywords: vec![Keyword {
                text: "running shoes".to_string(),
                match_type: MatchType::Phrase,
            }],
            ad_copy: AdCopy {
                headlines: vec!["Running Shoes 30% Off".to_string()],
                descriptions: vec!["Free shipping on every order.".to_string()],
                call_to_action: Some("Shop Now".to_string()),
                display_url: None,
            },
            schedule: None,
            conversion_value: Some(Decimal::new(80, 0)),
        }
    }

    #[test]
    fn valid_campaign_passes() {
        assert_eq!(validate_campaign(&campaign()), Ok(()));
    }

    #[test]
    fn rejects_zero_budget_and_duration() {
        let mut c = campaign();
        c.daily_budget = Decimal::ZERO;
        assert_eq!(validate_campaign(&c), Err(ValidationError::NonPositiveBudget));

        let mut c = campaign();
        c.duration_days = 0;
        assert_eq!(validate_campaign(&c), Err(ValidationError::DurationOutOfRange(0)));
    }

    #[test]
    fn rejects_blank_headlines_and_keywords() {
        let mut c = campaign();
        c.ad_copy.headlines = vec!["   ".to_string()];
        assert_eq!(validate_campaign(&c), Err(ValidationError::MissingHeadline));

        let mut c = campaign();
        c.keywords.push(Keyword {
            text: String::new(),
            match_type: MatchType::Exact,
        });
        assert_eq!(validate_campaign(&c), Err(ValidationError::EmptyKeyword));
    }

    #[test]
    fn rejects_bad_bids_ages_and_schedules() {
        let mut c = campaign();
        c.bid_strategy = BidStrategy::TargetCpa {
            target_cpa: Decimal::ZERO,
        };
        assert_eq!(validate_campaign(&c), Err(ValidationError::NonPositiveBid));

        c.bid_strategy = BidStrategy::ManualCpc {
            max_cpc: Decimal::new(5, 3),
        };
        assert_eq!(validate_campaign(&c), Err(ValidationError::BidBelowMinimum));
        c.bid_strategy = BidStrategy::ManualCpc { max_cpc: MIN_BID };
        assert_eq!(validate_campaign(&c), Ok(()));

        let mut c = campaign();
        c.targeting.age_min = 40;
        c.targeting.age_max = 30;
        assert_eq!(validate_campaign(&c), Err(ValidationError::AgeRange(40, 30)));

        let mut c = campaign();
        c.schedule = Some(AdSchedule {
            start_hour: 20,
            end_hour: 8,
        });
        assert_eq!(validate_campaign(&c), Err(ValidationError::InvalidSchedule(20, 8)));
    }

    #[test]
    fn device_targeting_defaults_to_all() {
        let mut t = Targeting::default();
        assert_eq!(t.targeted_devices(), Device::ALL.to_vec());
        t.devices = vec![Device::Mobile];
        assert!(t.targets(Device::Mobile));
        assert!(!t.targets(Device::Desktop));
    }

    #[test]
    fn date_for_day_offsets_start() {
        let c = campaign();
        assert_eq!(c.date_for_day(0), c.start_date);
        assert_eq!(c.date_for_day(31), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(c.total_budget(), Decimal::new(1500, 0));
    }

    #[test]
    fn campaign_yaml_uses_defaults() {
        let yaml = r#"
name: Demo
platform: linkedin
industry: saas
goal: leads
daily_budget: 120
start_date: 2024-09-02
duration_days: 14
bid_strategy:
  type: target_cpa
  target_cpa: 95.5
ad_copy:
  headlines: ["Cut onboarding time in half"]
"#;
        let c: Campaign = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(c.platform, Platform::LinkedIn);
        assert_eq!(c.targeting, Targeting::default());
        assert_eq!(
            c.bid_strategy,
            BidStrategy::TargetCpa {
                target_cpa: Decimal::new(955, 1)
            }
        );
        validate_campaign(&c).unwrap();

        let s = serde_json::to_string(&c).unwrap();
        let back: Campaign = serde_json::from_str(&s).unwrap();
        assert_eq!(back, c);
    }

    proptest! {
        #[test]
        fn any_sane_age_band_is_valid(min in 13u8..=65, span in 0u8..=52) {
            let max = min.saturating_add(span).min(65);
            let t = Targeting { age_min: min, age_max: max, ..Targeting::default() };
            prop_assert!(validate_targeting(&t).is_ok());
        }

        #[test]
        fn noise_range_is_enforced(n in -1.0f32..2.0) {
            let cfg = SimConfig { rng_seed: 1, noise_frac: n };
            prop_assert_eq!(validate_sim_config(&cfg).is_ok(), (0.0..1.0).contains(&n));
        }
    }
}
