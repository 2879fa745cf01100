//! Rule-based findings about a simulated campaign.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sim_ads::benchmarks::{benchmark, goal_profile};
use sim_core::{BidStrategy, Campaign, Simulation};
use std::fmt;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
    AdCopy,
    Keywords,
    Targeting,
    Bidding,
    Budget,
    Conversion,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl Area {
    pub fn as_str(self) -> &'static str {
        match self {
            Area::AdCopy => "ad copy",
            Area::Keywords => "keywords",
            Area::Targeting => "targeting",
            Area::Bidding => "bidding",
            Area::Budget => "budget",
            Area::Conversion => "conversion",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub severity: Severity,
    pub area: Area,
    pub message: String,
}

impl Insight {
    fn new(severity: Severity, area: Area, message: impl Into<String>) -> Self {
        Self {
            severity,
            area,
            message: message.into(),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity.as_str(), self.area.as_str(), self.message)
    }
}

const WEAK_FACTOR: f64 = 0.5;

fn weak_factor_advice(c: &Campaign, sim: &Simulation) -> Vec<Insight> {
    let f = &sim.factors;
    let mut out = Vec::new();
    if f.ad_quality < WEAK_FACTOR {
        out.push(Insight::new(
            Severity::Warning,
            Area::AdCopy,
            format!(
                "ad copy scores {:.2}; add a clear call to action, a concrete number and a \
                 benefit, and keep within {} characters per headline",
                f.ad_quality,
                c.platform.headline_limit()
            ),
        ));
    }
    if f.keyword_relevance < WEAK_FACTOR {
        let message = if c.platform.keyword_driven() {
            format!(
                "keyword relevance is {:.2}; use your keywords in the headlines and mix in \
                 phrase or exact match",
                f.keyword_relevance
            )
        } else {
            format!(
                "audience definition is {:.2}; add three to eight interests or job titles",
                f.keyword_relevance
            )
        };
        out.push(Insight::new(Severity::Warning, Area::Keywords, message));
    }
    if f.targeting < WEAK_FACTOR {
        out.push(Insight::new(
            Severity::Warning,
            Area::Targeting,
            format!(
                "targeting scores {:.2}; name locations and narrow the age band",
                f.targeting
            ),
        ));
    }
    if f.bid_competitiveness < WEAK_FACTOR {
        out.push(Insight::new(
            Severity::Warning,
            Area::Bidding,
            format!(
                "bid competitiveness is {:.2}; the bid is likely losing auctions",
                f.bid_competitiveness
            ),
        ));
    }
    out
}

fn weakest_area(sim: &Simulation) -> Area {
    let f = &sim.factors;
    [
        (f.ad_quality, Area::AdCopy),
        (f.keyword_relevance, Area::Keywords),
        (f.targeting, Area::Targeting),
    ]
    .into_iter()
    .min_by(|a, b| a.0.total_cmp(&b.0))
    .map(|(_, area)| area)
    .unwrap_or(Area::AdCopy)
}

/// Findings ordered from most to least severe.
pub fn analyze(c: &Campaign, sim: &Simulation) -> Vec<Insight> {
    let s = &sim.summary;
    let b = benchmark(c.platform, c.industry);
    let goal = goal_profile(c.goal);
    let expected_ctr = b.ctr * goal.ctr;
    let expected_cpc = b.cpc * goal.cpc;
    let avg_cpc = s.avg_cpc.to_f64().unwrap_or(0.0);
    let mut out = Vec::new();

    let qs = sim.quality_score;
    if qs <= 6 {
        let severity = if qs <= 4 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let area = weakest_area(sim);
        out.push(Insight::new(
            severity,
            area,
            format!("quality score is {qs}/10; {} is the weakest factor", area.as_str()),
        ));
    }
    out.extend(weak_factor_advice(c, sim));

    if s.impressions > 0 && s.ctr < 0.7 * expected_ctr {
        out.push(Insight::new(
            Severity::Warning,
            Area::AdCopy,
            format!(
                "CTR of {:.2}% is well below the {:.2}% benchmark",
                s.ctr * 100.0,
                expected_ctr * 100.0
            ),
        ));
    } else if s.ctr >= 1.2 * expected_ctr {
        out.push(Insight::new(
            Severity::Info,
            Area::AdCopy,
            format!("CTR of {:.2}% beats the benchmark", s.ctr * 100.0),
        ));
    }

    if s.clicks > 0 && avg_cpc > 1.3 * expected_cpc {
        out.push(Insight::new(
            Severity::Warning,
            Area::Bidding,
            format!("average CPC of ${avg_cpc:.2} is above the ${expected_cpc:.2} benchmark"),
        ));
    }

    if s.clicks > 0 && s.conversions == 0 {
        out.push(Insight::new(
            Severity::Critical,
            Area::Conversion,
            format!(
                "{} clicks produced no conversions; check the landing page and conversion tracking",
                s.clicks
            ),
        ));
    }

    if s.budget_utilization >= 0.98 {
        out.push(Insight::new(
            Severity::Warning,
            Area::Budget,
            "budget ran out every day; raise the budget or tighten targeting to buy cheaper clicks",
        ));
    } else if s.budget_utilization < 0.6 {
        out.push(Insight::new(
            Severity::Info,
            Area::Budget,
            format!(
                "only {:.0}% of the budget was spent; the audience or the bid is limiting delivery",
                s.budget_utilization * 100.0
            ),
        ));
    }

    if let (BidStrategy::TargetCpa { target_cpa }, Some(cpa)) = (&c.bid_strategy, s.cpa) {
        if cpa > *target_cpa {
            out.push(Insight::new(
                Severity::Warning,
                Area::Bidding,
                format!("CPA of ${cpa} exceeds the ${target_cpa} target"),
            ));
        }
    }

    out.sort_by(|a, b| b.severity.cmp(&a.severity));
    debug!(campaign = %c.name, insights = out.len(), "analyzed simulation");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sim_core::{
        AdCopy, CampaignGoal, Industry, Platform, QualityFactors, SimulationSummary, Targeting,
    };

    fn campaign() -> Campaign {
        Campaign {
            name: "Leads".into(),
            platform: Platform::LinkedIn,
            industry: Industry::Saas,
            goal: CampaignGoal::Leads,
            daily_budget: Decimal::new(100, 0),
            bid_strategy: BidStrategy::TargetCpa {
                target_cpa: Decimal::new(80, 0),
            },
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            duration_days: 10,
            targeting: Targeting::default(),
            keywords: vec![],
            ad_copy: AdCopy {
                headlines: vec!["Ship faster".into()],
                ..AdCopy::default()
            },
            schedule: None,
            conversion_value: None,
        }
    }

    fn simulation(qs: u8, factors: QualityFactors, summary: SimulationSummary) -> Simulation {
        Simulation {
            campaign_name: "Leads".into(),
            platform: Platform::LinkedIn,
            industry: Industry::Saas,
            seed: 1,
            factors,
            quality_score: qs,
            days: vec![],
            summary,
        }
    }

    fn healthy_factors() -> QualityFactors {
        QualityFactors {
            ad_quality: 0.8,
            keyword_relevance: 0.9,
            targeting: 0.7,
            bid_competitiveness: 0.8,
        }
    }

    #[test]
    fn zero_conversions_is_critical_and_first() {
        let s = SimulationSummary {
            impressions: 50_000,
            clicks: 200,
            ctr: 0.004,
            avg_cpc: Decimal::new(500, 2),
            budget_utilization: 1.0,
            ..SimulationSummary::default()
        };
        let insights = analyze(&campaign(), &simulation(8, healthy_factors(), s));
        assert_eq!(insights[0].severity, Severity::Critical);
        assert_eq!(insights[0].area, Area::Conversion);
        assert!(insights.iter().any(|i| i.area == Area::Budget && i.severity == Severity::Warning));
    }

    #[test]
    fn low_quality_points_at_weakest_factor() {
        let factors = QualityFactors {
            ad_quality: 0.6,
            keyword_relevance: 0.3,
            targeting: 0.2,
            bid_competitiveness: 0.9,
        };
        let s = SimulationSummary {
            impressions: 1_000,
            clicks: 10,
            conversions: 1,
            ctr: 0.01,
            avg_cpc: Decimal::new(100, 2),
            budget_utilization: 0.8,
            cpa: Some(Decimal::new(10, 0)),
            ..SimulationSummary::default()
        };
        let insights = analyze(&campaign(), &simulation(3, factors, s));
        let qs = &insights[0];
        assert_eq!(qs.severity, Severity::Critical);
        assert_eq!(qs.area, Area::Targeting);
        assert!(qs.message.contains("3/10"));
        assert!(insights.iter().any(|i| i.area == Area::Keywords));
        assert!(insights[1..].iter().all(|i| i.severity <= Severity::Warning));
    }

    #[test]
    fn missed_target_cpa_is_flagged() {
        let s = SimulationSummary {
            impressions: 10_000,
            clicks: 60,
            conversions: 2,
            ctr: 0.006,
            avg_cpc: Decimal::new(500, 2),
            budget_utilization: 0.75,
            cpa: Some(Decimal::new(150, 0)),
            ..SimulationSummary::default()
        };
        let insights = analyze(&campaign(), &simulation(8, healthy_factors(), s));
        let cpa = insights
            .iter()
            .find(|i| i.message.contains("target"))
            .unwrap();
        assert_eq!(cpa.area, Area::Bidding);
        assert!(cpa.to_string().starts_with("[warning] bidding:"));
    }

    #[test]
    fn underspend_is_informational() {
        let s = SimulationSummary {
            impressions: 10_000,
            clicks: 60,
            conversions: 4,
            ctr: 0.004,
            avg_cpc: Decimal::new(500, 2),
            budget_utilization: 0.3,
            cpa: Some(Decimal::new(75, 0)),
            ..SimulationSummary::default()
        };
        let insights = analyze(&campaign(), &simulation(8, healthy_factors(), s));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].severity, Severity::Info);
        assert!(insights[0].message.contains("30%"));
    }
}
