#![deny(warnings)]

//! Ad-performance simulation engine for adlab.
//!
//! The engine turns a [`Campaign`] into a fabricated [`Simulation`]:
//! - factor extraction from the configuration ([`factors`])
//! - day-indexed market conditions ([`market`])
//! - chained metric formulas with seeded noise ([`metrics`])
//!
//! Runs are reproducible: the same campaign and [`SimConfig`] always yield
//! the same simulation.

pub mod benchmarks;
pub mod factors;
pub mod market;
pub mod metrics;

pub use benchmarks::{benchmark, Benchmark};
pub use factors::{extract_factors, quality_score, score_copy, CopyScore};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sim_core::{
    validate_campaign, validate_sim_config, Campaign, DailyMetrics, SimConfig, Simulation,
    SimulationSummary, ValidationError,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors produced by the simulation engine.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    /// The campaign or configuration violates a domain invariant.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// A heuristic produced a non-finite value.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

/// Simulate a campaign over its whole flight.
///
/// Example:
/// let sim = simulate(&campaign, &SimConfig::default())?;
/// assert_eq!(sim.days.len(), campaign.duration_days as usize);
pub fn simulate(c: &Campaign, cfg: &SimConfig) -> Result<Simulation, SimError> {
    validate_campaign(c)?;
    validate_sim_config(cfg)?;

    let factors = extract_factors(c);
    let finite = [
        factors.ad_quality,
        factors.keyword_relevance,
        factors.targeting,
        factors.bid_competitiveness,
    ]
    .iter()
    .all(|v| v.is_finite());
    if !finite {
        return Err(SimError::NonFinite("quality factors"));
    }
    let qs = quality_score(&factors);
    let noise = f64::from(cfg.noise_frac);
    debug!(campaign = %c.name, ?factors, quality_score = qs, "extracted factors");

    let mut rng = ChaCha8Rng::seed_from_u64(cfg.rng_seed);
    let mut days = Vec::with_capacity(usize::from(c.duration_days));
    for i in 0..c.duration_days {
        let m = market::market_conditions(c, i, &mut rng, noise);
        let d = metrics::daily_metrics(c, &factors, qs, &m, &mut rng, noise);
        debug!(
            day = i,
            seasonality = m.seasonality,
            competition = m.competition,
            impressions = d.impressions,
            clicks = d.clicks,
            cost = %d.cost,
            "simulated day"
        );
        days.push(d);
    }

    let summary = summarize(c, &days);
    info!(
        campaign = %c.name,
        platform = %c.platform,
        days = summary.days,
        impressions = summary.impressions,
        clicks = summary.clicks,
        conversions = summary.conversions,
        cost = %summary.cost,
        quality_score = qs,
        "simulation complete"
    );

    Ok(Simulation {
        campaign_name: c.name.clone(),
        platform: c.platform,
        industry: c.industry,
        seed: cfg.rng_seed,
        factors,
        quality_score: qs,
        days,
        summary,
    })
}

/// Aggregate daily rows into totals and derived rates.
pub fn summarize(c: &Campaign, days: &[DailyMetrics]) -> SimulationSummary {
    let impressions: u64 = days.iter().map(|d| d.impressions).sum();
    let clicks: u64 = days.iter().map(|d| d.clicks).sum();
    let conversions: u64 = days.iter().map(|d| d.conversions).sum();
    let cost: Decimal = days.iter().map(|d| d.cost).sum();

    let rate = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let avg_cpc = if clicks == 0 {
        Decimal::ZERO
    } else {
        (cost / Decimal::from(clicks)).round_dp(2)
    };
    let cpa = (conversions > 0).then(|| (cost / Decimal::from(conversions)).round_dp(2));
    let revenue = c
        .conversion_value
        .map(|v| (v * Decimal::from(conversions)).round_dp(2));
    let roas = match revenue {
        Some(r) if cost > Decimal::ZERO => (r / cost).to_f64(),
        _ => None,
    };
    let budget = c.daily_budget * Decimal::from(days.len() as u64);
    let budget_utilization = if budget > Decimal::ZERO {
        (cost / budget).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SimulationSummary {
        days: u16::try_from(days.len()).unwrap_or(u16::MAX),
        impressions,
        clicks,
        conversions,
        cost,
        ctr: rate(clicks, impressions),
        avg_cpc,
        conversion_rate: rate(conversions, clicks),
        cpa,
        revenue,
        roas,
        budget_utilization,
    }
}
