//! Simulated performance records produced by the engine.

use crate::{Industry, Platform};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Heuristic sub-scores extracted from a campaign configuration, each in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityFactors {
    /// Creative quality from pattern matches on the ad copy.
    pub ad_quality: f64,
    /// Keyword to copy relevance (audience definition for social platforms).
    pub keyword_relevance: f64,
    /// Targeting completeness.
    pub targeting: f64,
    /// How competitive the bid is against the market CPC.
    pub bid_competitiveness: f64,
}

/// Synthetic market state for one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub day_index: u16,
    pub date: NaiveDate,
    /// Demand multiplier (month, weekday and intra-month cycle).
    pub seasonality: f64,
    /// Auction pressure multiplier applied to CPC.
    pub competition: f64,
    /// Traffic-weighted CTR multiplier of the scheduled hours.
    pub time_of_day_ctr: f64,
    /// Share of daily traffic that falls inside the schedule, in (0, 1].
    pub time_of_day_share: f64,
}

/// Metrics for one simulated day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub day_index: u16,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Spend in USD, never above the daily budget.
    pub cost: Decimal,
    pub ctr: f64,
    /// Actual cost per click in USD.
    pub cpc: Decimal,
    pub conversion_rate: f64,
}

/// Aggregates over a whole simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub days: u16,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub cost: Decimal,
    pub ctr: f64,
    pub avg_cpc: Decimal,
    pub conversion_rate: f64,
    /// Cost per conversion; `None` without conversions.
    pub cpa: Option<Decimal>,
    /// Conversions times conversion value, when the value is known.
    pub revenue: Option<Decimal>,
    /// Revenue over cost; `None` without revenue or spend.
    pub roas: Option<f64>,
    /// Spend over total budget, in [0, 1].
    pub budget_utilization: f64,
}

/// A fabricated performance record for one campaign run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub campaign_name: String,
    pub platform: Platform,
    pub industry: Industry,
    pub seed: u64,
    pub factors: QualityFactors,
    /// Quality score in 1..=10.
    pub quality_score: u8,
    pub days: Vec<DailyMetrics>,
    pub summary: SimulationSummary,
}
