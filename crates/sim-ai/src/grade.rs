//! Letter grades from a weighted utility of ratios to benchmark.

use crate::FeedbackError;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sim_ads::Benchmark;
use sim_core::Simulation;
use std::fmt;

/// Quality score treated as par.
const PAR_QUALITY_SCORE: f64 = 7.0;
/// Ratios are capped so one outlier metric cannot carry a grade.
const MAX_RATIO: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_utility(u: f64) -> Grade {
        if u >= 1.2 {
            Grade::A
        } else if u >= 1.0 {
            Grade::B
        } else if u >= 0.8 {
            Grade::C
        } else if u >= 0.6 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Utility weights. Loadable from YAML, e.g. `ctr: 0.4\ncpc: 0.2\ncvr: 0.3\nquality: 0.1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeWeights {
    pub ctr: f64,
    pub cpc: f64,
    pub cvr: f64,
    pub quality: f64,
}

impl Default for GradeWeights {
    fn default() -> Self {
        Self {
            ctr: 0.3,
            cpc: 0.2,
            cvr: 0.3,
            quality: 0.2,
        }
    }
}

impl GradeWeights {
    pub fn from_yaml(s: &str) -> Result<Self, FeedbackError> {
        let w: GradeWeights =
            serde_yaml::from_str(s).map_err(|e| FeedbackError::Weights(e.to_string()))?;
        w.validate()?;
        Ok(w)
    }

    pub fn validate(&self) -> Result<(), FeedbackError> {
        let all = [self.ctr, self.cpc, self.cvr, self.quality];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(FeedbackError::Weights("weights must be finite and >= 0".into()));
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err(FeedbackError::Weights("at least one weight must be > 0".into()));
        }
        Ok(())
    }

    fn total(&self) -> f64 {
        self.ctr + self.cpc + self.cvr + self.quality
    }
}

/// Per-metric ratios to benchmark (1.0 = par, higher is better) and the grade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub ctr_ratio: f64,
    pub cpc_ratio: f64,
    pub cvr_ratio: f64,
    pub quality_ratio: f64,
    pub utility: f64,
    pub grade: Grade,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den <= 0.0 || !num.is_finite() {
        return 0.0;
    }
    (num / den).clamp(0.0, MAX_RATIO)
}

/// Weighted utility: 1.0 means the run matched its benchmark on every metric.
pub fn utility(card: &ScoreCard, w: &GradeWeights) -> f64 {
    let total = w.total();
    if total <= 0.0 {
        return 0.0;
    }
    (w.ctr * card.ctr_ratio
        + w.cpc * card.cpc_ratio
        + w.cvr * card.cvr_ratio
        + w.quality * card.quality_ratio)
        / total
}

/// Score a simulation against a benchmark with explicit weights.
pub fn score_card(sim: &Simulation, b: &Benchmark, w: &GradeWeights) -> ScoreCard {
    let s = &sim.summary;
    let avg_cpc = s.avg_cpc.to_f64().unwrap_or(0.0);
    let mut card = ScoreCard {
        ctr_ratio: ratio(s.ctr, b.ctr),
        cpc_ratio: if s.clicks == 0 { 0.0 } else { ratio(b.cpc, avg_cpc) },
        cvr_ratio: ratio(s.conversion_rate, b.cvr),
        quality_ratio: ratio(f64::from(sim.quality_score), PAR_QUALITY_SCORE),
        utility: 0.0,
        grade: Grade::F,
    };
    card.utility = utility(&card, w);
    card.grade = if s.clicks == 0 {
        Grade::F
    } else {
        Grade::from_utility(card.utility)
    };
    card
}

/// Letter grade with the default weights.
pub fn grade(sim: &Simulation, b: &Benchmark) -> Grade {
    score_card(sim, b, &GradeWeights::default()).grade
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use sim_core::{Industry, Platform, QualityFactors, SimulationSummary};

    fn bench() -> Benchmark {
        Benchmark {
            ctr: 0.02,
            cpc: 2.0,
            cvr: 0.05,
            competition: 1.0,
        }
    }

    fn sim(ctr: f64, cpc: i64, cvr: f64, qs: u8) -> Simulation {
        Simulation {
            campaign_name: "c".into(),
            platform: Platform::Google,
            industry: Industry::Other,
            seed: 1,
            factors: QualityFactors::default(),
            quality_score: qs,
            days: vec![],
            summary: SimulationSummary {
                days: 1,
                impressions: 10_000,
                clicks: 100,
                conversions: 5,
                cost: Decimal::new(200, 0),
                ctr,
                avg_cpc: Decimal::new(cpc, 2),
                conversion_rate: cvr,
                ..SimulationSummary::default()
            },
        }
    }

    #[test]
    fn par_performance_is_a_b() {
        let card = score_card(&sim(0.02, 200, 0.05, 7), &bench(), &GradeWeights::default());
        assert!((card.utility - 1.0).abs() < 1e-9);
        assert_eq!(card.grade, Grade::B);
    }

    #[test]
    fn grades_follow_performance() {
        assert_eq!(grade(&sim(0.04, 100, 0.10, 10), &bench()), Grade::A);
        assert_eq!(grade(&sim(0.005, 600, 0.01, 2), &bench()), Grade::F);
        assert!(Grade::A < Grade::C);
    }

    #[test]
    fn no_clicks_fails() {
        let mut s = sim(0.0, 0, 0.0, 9);
        s.summary.clicks = 0;
        assert_eq!(grade(&s, &bench()), Grade::F);
    }

    #[test]
    fn weights_load_from_yaml() {
        let w = GradeWeights::from_yaml("ctr: 0.5\ncvr: 0.5\ncpc: 0\nquality: 0\n").unwrap();
        assert_eq!(w.ctr, 0.5);
        let card = score_card(&sim(0.04, 200, 0.05, 1), &bench(), &w);
        assert!((card.utility - 1.5).abs() < 1e-9);
        assert!(GradeWeights::from_yaml("ctr: -1").is_err());
        assert!(GradeWeights::from_yaml("ctr: 0\ncpc: 0\ncvr: 0\nquality: 0").is_err());
    }

    proptest! {
        #[test]
        fn utility_is_bounded(
            ctr in 0.0f64..1.0,
            cpc in 1i64..10_000,
            cvr in 0.0f64..1.0,
            qs in 1u8..=10,
        ) {
            let card = score_card(&sim(ctr, cpc, cvr, qs), &bench(), &GradeWeights::default());
            prop_assert!((0.0..=MAX_RATIO).contains(&card.utility));
        }
    }
}
