//! Metric formulas: chained benchmark × factor multipliers × noise.

use crate::benchmarks::{benchmark, device_profile, goal_profile, Benchmark};
use crate::market::jitter;
use rand::Rng;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use sim_core::{
    BidStrategy, Campaign, DailyMetrics, MarketConditions, MatchType, Platform, QualityFactors,
    Targeting,
};

const MIN_CPC: Decimal = sim_core::MIN_BID;

/// Traffic-weighted device multipliers over the targeted devices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceMix {
    /// Share of platform traffic reachable on the targeted devices.
    pub share: f64,
    pub ctr: f64,
    pub cvr: f64,
}

pub fn device_mix(t: &Targeting, platform: Platform) -> DeviceMix {
    let mut share = 0.0;
    let mut ctr = 0.0;
    let mut cvr = 0.0;
    for d in t.targeted_devices() {
        let p = device_profile(platform, d);
        share += p.share;
        ctr += p.share * p.ctr;
        cvr += p.share * p.cvr;
    }
    if share <= 0.0 {
        return DeviceMix {
            share: 0.0,
            ctr: 1.0,
            cvr: 1.0,
        };
    }
    DeviceMix {
        share,
        ctr: ctr / share,
        cvr: cvr / share,
    }
}

/// CPC multiplier of an automated bid strategy.
pub fn strategy_cpc_factor(strategy: &BidStrategy) -> f64 {
    match strategy {
        BidStrategy::ManualCpc { .. } => 1.0,
        BidStrategy::MaximizeClicks => 0.92,
        BidStrategy::MaximizeConversions => 1.12,
        BidStrategy::TargetCpa { .. } => 1.05,
    }
}

/// Conversion-rate multiplier of an automated bid strategy.
pub fn strategy_cvr_factor(strategy: &BidStrategy) -> f64 {
    match strategy {
        BidStrategy::MaximizeConversions => 1.10,
        BidStrategy::TargetCpa { .. } => 1.08,
        BidStrategy::ManualCpc { .. } | BidStrategy::MaximizeClicks => 1.0,
    }
}

/// Auction price of a click before quality discounts and bid caps.
pub fn market_cpc(c: &Campaign, b: &Benchmark, competition: f64) -> f64 {
    b.cpc * competition * goal_profile(c.goal).cpc * strategy_cpc_factor(&c.bid_strategy)
}

/// Fraction of the platform's daily users that see at least one eligible placement.
pub fn reach_rate(platform: Platform) -> f64 {
    match platform {
        Platform::Google => 1.0,
        Platform::Meta => 0.04,
        Platform::LinkedIn => 0.025,
    }
}

/// Addressable audience: daily searches for search campaigns, people otherwise.
pub fn estimate_audience(c: &Campaign) -> u64 {
    let t = &c.targeting;
    let base: f64 = match c.platform {
        Platform::Google if c.keywords.is_empty() => 500.0,
        Platform::Google => c
            .keywords
            .iter()
            .map(|k| match k.match_type {
                MatchType::Broad => 4000.0,
                MatchType::Phrase => 1500.0,
                MatchType::Exact => 600.0,
            })
            .sum(),
        Platform::Meta => 3_000_000.0,
        Platform::LinkedIn => 800_000.0,
    };

    let location = if t.locations.is_empty() {
        1.0
    } else {
        (0.12 * t.locations.len() as f64).min(1.0)
    };
    let age_years = f64::from(t.age_max.saturating_sub(t.age_min)) + 1.0;
    let age = (age_years / 48.0).clamp(0.05, 1.0);
    let interests = if c.platform.keyword_driven() || t.interests.is_empty() {
        1.0
    } else {
        (0.25 + 0.1 * t.interests.len() as f64).min(0.8)
    };
    let job_titles = if c.platform != Platform::LinkedIn || t.job_titles.is_empty() {
        1.0
    } else {
        (0.05 * t.job_titles.len() as f64).clamp(0.05, 0.5)
    };
    let devices = device_mix(t, c.platform).share;

    let audience = base * location * age * interests * job_titles * devices;
    if audience.is_finite() && audience > 0.0 {
        audience.round() as u64
    } else {
        0
    }
}

fn to_money(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO).round_dp(2)
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Metrics for one day.
///
/// Draws exactly four values from `rng` (CTR, CPC, conversion rate and
/// impressions) when `noise` is positive.
pub fn daily_metrics<R: Rng + ?Sized>(
    c: &Campaign,
    factors: &QualityFactors,
    quality_score: u8,
    m: &MarketConditions,
    rng: &mut R,
    noise: f64,
) -> DailyMetrics {
    let b = benchmark(c.platform, c.industry);
    let goal = goal_profile(c.goal);
    let devices = device_mix(&c.targeting, c.platform);
    let qs = f64::from(quality_score.clamp(1, 10));

    let quality_impact = 0.5 + qs / 10.0;
    let ctr = (b.ctr
        * quality_impact
        * goal.ctr
        * devices.ctr
        * m.time_of_day_ctr
        * m.seasonality
        * jitter(rng, noise))
    .clamp(0.0005, 0.5);

    let quality_discount = 1.5 - 0.1 * qs;
    let raw_cpc = market_cpc(c, &b, m.competition) * quality_discount * jitter(rng, noise);
    let mut cpc = to_money(raw_cpc).max(MIN_CPC);
    if let BidStrategy::ManualCpc { max_cpc } = &c.bid_strategy {
        // The bid cap applies after cent rounding; validation keeps it at or above one cent.
        let cap = max_cpc.round_dp_with_strategy(2, RoundingStrategy::ToZero);
        cpc = cpc.min(cap).max(MIN_CPC);
    }

    let landing = 0.7 + 0.6 * factors.targeting;
    let cvr = (b.cvr
        * goal.cvr
        * devices.cvr
        * landing
        * strategy_cvr_factor(&c.bid_strategy)
        * jitter(rng, noise))
    .clamp(0.0, 0.9);

    let impression_share = 0.25 + 0.75 * factors.bid_competitiveness.clamp(0.0, 1.0);
    let potential = estimate_audience(c) as f64
        * reach_rate(c.platform)
        * m.seasonality
        * m.time_of_day_share
        * impression_share;
    let budget = c.daily_budget.to_f64().unwrap_or(0.0);
    let cpc_f = cpc.to_f64().unwrap_or(0.01);
    let budget_limited = budget / (cpc_f * ctr);
    let served = potential.min(budget_limited) * jitter(rng, noise);
    let impressions = if served.is_finite() && served > 0.0 {
        served.floor() as u64
    } else {
        0
    };

    let mut clicks = ((impressions as f64) * ctr).round() as u64;
    clicks = clicks.min(impressions);
    let mut cost = cpc * Decimal::from(clicks);
    if cost > c.daily_budget {
        clicks = (c.daily_budget / cpc).floor().to_u64().unwrap_or(0);
        cost = cpc * Decimal::from(clicks);
    }
    let conversions = (((clicks as f64) * cvr).round() as u64).min(clicks);

    DailyMetrics {
        date: m.date,
        day_index: m.day_index,
        impressions,
        clicks,
        conversions,
        cost,
        ctr: ratio(clicks, impressions),
        cpc,
        conversion_rate: ratio(conversions, clicks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{extract_factors, quality_score};
    use crate::market::market_conditions;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sim_core::{AdCopy, CampaignGoal, Device, Industry, Keyword};

    fn campaign(budget: Decimal) -> Campaign {
        Campaign {
            name: "B2B leads".into(),
            platform: Platform::LinkedIn,
            industry: Industry::Saas,
            goal: CampaignGoal::Leads,
            daily_budget: budget,
            bid_strategy: BidStrategy::MaximizeConversions,
            start_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            duration_days: 14,
            targeting: Targeting {
                locations: vec!["United States".into()],
                age_min: 25,
                age_max: 54,
                interests: vec!["cloud computing".into()],
                job_titles: vec!["CTO".into(), "VP Engineering".into()],
                devices: vec![],
            },
            keywords: vec![],
            ad_copy: AdCopy {
                headlines: vec!["Cut cloud costs by 30% in 90 days".into()],
                descriptions: vec!["Join 2,000 engineering leaders. Get the free playbook.".into()],
                call_to_action: Some("Download".into()),
                display_url: None,
            },
            schedule: None,
            conversion_value: None,
        }
    }

    fn run_day(c: &Campaign, seed: u64, noise: f64) -> DailyMetrics {
        let f = extract_factors(c);
        let qs = quality_score(&f);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let m = market_conditions(c, 0, &mut rng, noise);
        daily_metrics(c, &f, qs, &m, &mut rng, noise)
    }

    #[test]
    fn device_mix_of_all_devices_is_full_share() {
        let mix = device_mix(&Targeting::default(), Platform::Google);
        assert!((mix.share - 1.0).abs() < 1e-9);
        let mobile_only = Targeting {
            devices: vec![Device::Mobile],
            ..Targeting::default()
        };
        let mix = device_mix(&mobile_only, Platform::Google);
        assert!((mix.share - 0.57).abs() < 1e-9);
        assert!((mix.ctr - 1.08).abs() < 1e-9);
    }

    #[test]
    fn audience_narrows_with_targeting() {
        let mut c = campaign(Decimal::new(200, 0));
        let narrow = estimate_audience(&c);
        c.targeting = Targeting::default();
        let broad = estimate_audience(&c);
        assert!(narrow < broad);
        assert_eq!(broad, 800_000);
    }

    #[test]
    fn search_audience_sums_keyword_volume() {
        let mut c = campaign(Decimal::new(200, 0));
        c.platform = Platform::Google;
        c.targeting = Targeting::default();
        assert_eq!(estimate_audience(&c), 500);
        c.keywords = vec![
            Keyword {
                text: "crm software".into(),
                match_type: MatchType::Broad,
            },
            Keyword {
                text: "best crm".into(),
                match_type: MatchType::Exact,
            },
        ];
        assert_eq!(estimate_audience(&c), 4600);
    }

    #[test]
    fn strategy_factors_match_table() {
        assert_eq!(strategy_cpc_factor(&BidStrategy::MaximizeClicks), 0.92);
        assert_eq!(strategy_cvr_factor(&BidStrategy::MaximizeClicks), 1.0);
        assert_eq!(strategy_cvr_factor(&BidStrategy::MaximizeConversions), 1.10);
    }

    #[test]
    fn small_budget_is_spent_but_not_exceeded() {
        let c = campaign(Decimal::new(25, 0));
        let d = run_day(&c, 7, 0.15);
        assert!(d.cost <= c.daily_budget);
        assert!(d.clicks <= d.impressions);
        assert!(d.conversions <= d.clicks);
        assert!(d.cpc >= MIN_CPC);
    }

    #[test]
    fn manual_cpc_caps_price() {
        let mut c = campaign(Decimal::new(500, 0));
        c.bid_strategy = BidStrategy::ManualCpc {
            max_cpc: Decimal::new(300, 2),
        };
        let d = run_day(&c, 11, 0.15);
        assert!(d.cpc <= Decimal::new(300, 2));
    }

    #[test]
    fn fractional_cent_bid_is_never_exceeded() {
        let mut c = campaign(Decimal::new(500, 0));
        let bid = Decimal::new(14_051, 4);
        c.bid_strategy = BidStrategy::ManualCpc { max_cpc: bid };
        for seed in 0..20 {
            let d = run_day(&c, seed, 0.15);
            assert!(d.cpc <= bid, "seed {seed}: {}", d.cpc);
            assert_eq!(d.cpc, Decimal::new(140, 2));
        }
    }

    #[test]
    fn same_seed_same_day() {
        let c = campaign(Decimal::new(300, 0));
        assert_eq!(run_day(&c, 5, 0.2), run_day(&c, 5, 0.2));
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_budget(cents in 100i64..5_000_000, seed in 0u64..1000) {
            let c = campaign(Decimal::new(cents, 2));
            let d = run_day(&c, seed, 0.3);
            prop_assert!(d.cost <= c.daily_budget);
            prop_assert!(d.clicks <= d.impressions);
            prop_assert!(d.conversions <= d.clicks);
            prop_assert!((0.0..=1.0).contains(&d.ctr));
        }
    }
}
