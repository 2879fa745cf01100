//! Chart-choice challenges over synthetic marketing datasets.

use crate::LabError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const CHANNELS: [&str; 5] = ["Search", "Social", "Email", "Display", "Video"];
const ORDER_BUCKETS: [(&str, f64); 5] = [
    ("$0-25", 25.0),
    ("$25-50", 50.0),
    ("$50-75", 75.0),
    ("$75-100", 100.0),
    ("$100+", f64::INFINITY),
];
const ORDERS: usize = 500;
const WEEKS: usize = 12;

/// What the data is trying to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataShape {
    TimeSeries,
    Comparison,
    Composition,
    Distribution,
    Relationship,
}

impl DataShape {
    pub const ALL: [DataShape; 5] = [
        DataShape::TimeSeries,
        DataShape::Comparison,
        DataShape::Composition,
        DataShape::Distribution,
        DataShape::Relationship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataShape::TimeSeries => "time_series",
            DataShape::Comparison => "comparison",
            DataShape::Composition => "composition",
            DataShape::Distribution => "distribution",
            DataShape::Relationship => "relationship",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Area,
    Bar,
    Column,
    StackedBar,
    Pie,
    Histogram,
    Scatter,
    Table,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Bar,
        ChartKind::Column,
        ChartKind::StackedBar,
        ChartKind::Pie,
        ChartKind::Histogram,
        ChartKind::Scatter,
        ChartKind::Table,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Bar => "bar",
            ChartKind::Column => "column",
            ChartKind::StackedBar => "stacked_bar",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
            ChartKind::Scatter => "scatter",
            ChartKind::Table => "table",
        }
    }
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

impl FromStr for DataShape {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        DataShape::ALL
            .into_iter()
            .find(|d| d.as_str() == key)
            .ok_or_else(|| LabError::InvalidInput(format!("unknown data shape {s:?}")))
    }
}

impl FromStr for ChartKind {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        ChartKind::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| LabError::InvalidInput(format!("unknown chart kind {s:?}")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Best,
    Acceptable,
    Poor,
}

impl Verdict {
    fn score(self) -> u8 {
        match self {
            Verdict::Best => 100,
            Verdict::Acceptable => 60,
            Verdict::Poor => 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartGrade {
    pub score: u8,
    pub verdict: Verdict,
    pub rationale: String,
}

fn suitability(shape: DataShape, chart: ChartKind) -> Verdict {
    use ChartKind::*;
    use Verdict::*;
    match (shape, chart) {
        (DataShape::TimeSeries, Line | Area) => Best,
        (DataShape::TimeSeries, Column | Table) => Acceptable,
        (DataShape::Comparison, Bar | Column) => Best,
        (DataShape::Comparison, StackedBar | Table) => Acceptable,
        (DataShape::Composition, Pie | StackedBar) => Best,
        (DataShape::Composition, Area | Bar | Column | Table) => Acceptable,
        (DataShape::Distribution, Histogram) => Best,
        (DataShape::Distribution, Column | Scatter) => Acceptable,
        (DataShape::Relationship, Scatter) => Best,
        (DataShape::Relationship, Line | Table) => Acceptable,
        _ => Poor,
    }
}

fn best_for(shape: DataShape) -> Vec<ChartKind> {
    ChartKind::ALL
        .into_iter()
        .filter(|c| suitability(shape, *c) == Verdict::Best)
        .collect()
}

fn purpose(shape: DataShape) -> &'static str {
    match shape {
        DataShape::TimeSeries => "showing change over time",
        DataShape::Comparison => "comparing values across categories",
        DataShape::Composition => "showing parts of a whole",
        DataShape::Distribution => "showing how values are spread",
        DataShape::Relationship => "showing how two measures move together",
    }
}

/// Grade a chart choice for a data shape.
pub fn grade_chart(shape: DataShape, chart: ChartKind) -> ChartGrade {
    let verdict = suitability(shape, chart);
    let best = best_for(shape)
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(" or ");
    let rationale = match verdict {
        Verdict::Best => format!("a {chart} chart is a strong choice for {}", purpose(shape)),
        Verdict::Acceptable => format!(
            "a {chart} chart works for {}, but {best} reads more clearly",
            purpose(shape)
        ),
        Verdict::Poor => format!(
            "a {chart} chart obscures the point when {}; use {best}",
            purpose(shape)
        ),
    };
    ChartGrade {
        score: verdict.score(),
        verdict,
        rationale,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// A dataset plus the question a good chart should answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub shape: DataShape,
    pub seed: u64,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<DataSeries>,
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub chart: ChartKind,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResult {
    pub chart: ChartGrade,
    pub answer_correct: bool,
    pub expected_answer: String,
    /// 60 % chart choice, 40 % answer.
    pub score: u8,
}

/// Index of the largest value, or `None` when the maximum is shared.
fn unique_argmax(values: &[f64]) -> Option<usize> {
    let (best, top) = values
        .iter()
        .enumerate()
        .fold((None, f64::NEG_INFINITY), |(bi, bv), (i, v)| {
            if *v > bv {
                (Some(i), *v)
            } else {
                (bi, bv)
            }
        });
    let best = best?;
    (values.iter().filter(|v| **v == top).count() == 1).then_some(best)
}

fn round_to(v: f64, step: f64) -> f64 {
    (v / step).round() * step
}

fn series(name: &str, values: Vec<f64>) -> DataSeries {
    DataSeries {
        name: name.into(),
        values,
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len()) as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let vx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    let vy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
    if vx == 0.0 || vy == 0.0 {
        0.0
    } else {
        cov / (vx * vy).sqrt()
    }
}

/// Redraws allowed before giving up on an unambiguous dataset.
const MAX_DRAWS: usize = 32;

struct Draft {
    title: &'static str,
    labels: Vec<String>,
    series: Vec<DataSeries>,
    question: &'static str,
    answer: String,
}

/// One dataset draw; `None` when the answer would be ambiguous.
fn draw(shape: DataShape, rng: &mut ChaCha8Rng) -> Result<Option<Draft>, LabError> {
    let draft = match shape {
        DataShape::TimeSeries => {
            let peak_shift = rng.gen_range(0.0..std::f64::consts::TAU);
            let base: f64 = rng.gen_range(8_000.0..20_000.0);
            let sessions: Vec<f64> = (0..MONTHS.len())
                .map(|m| {
                    let angle = std::f64::consts::TAU * m as f64 / 12.0 + peak_shift;
                    let season = 1.0 + 0.35 * angle.sin();
                    round_to(base * season * rng.gen_range(0.9..1.1), 10.0)
                })
                .collect();
            unique_argmax(&sessions).map(|peak| Draft {
                title: "Website sessions by month",
                labels: labels(&MONTHS),
                series: vec![series("Sessions", sessions)],
                question: "In which month did sessions peak?",
                answer: MONTHS[peak].to_string(),
            })
        }
        DataShape::Comparison => {
            let spend: Vec<f64> = CHANNELS
                .iter()
                .map(|_| round_to(rng.gen_range(2_000.0..15_000.0), 100.0))
                .collect();
            let revenue: Vec<f64> = spend
                .iter()
                .map(|s| round_to(s * rng.gen_range(1.2..6.0), 100.0))
                .collect();
            let roas: Vec<f64> = spend.iter().zip(&revenue).map(|(s, r)| r / s).collect();
            unique_argmax(&roas).map(|top| Draft {
                title: "Spend and revenue by channel",
                labels: labels(&CHANNELS),
                series: vec![series("Spend", spend), series("Revenue", revenue)],
                question: "Which channel has the highest return on ad spend?",
                answer: CHANNELS[top].to_string(),
            })
        }
        DataShape::Composition => {
            let spend: Vec<f64> = CHANNELS
                .iter()
                .map(|_| round_to(rng.gen_range(1_000.0..20_000.0), 50.0))
                .collect();
            unique_argmax(&spend).map(|top| Draft {
                title: "Share of monthly ad spend",
                labels: labels(&CHANNELS),
                series: vec![series("Spend", spend)],
                question: "Which channel takes the largest share of spend?",
                answer: CHANNELS[top].to_string(),
            })
        }
        DataShape::Distribution => {
            let median = rng.gen_range(30.0..90.0f64);
            let order_values = LogNormal::new(median.ln(), 0.6)
                .map_err(|e| LabError::InvalidInput(format!("order value distribution: {e}")))?;
            let mut counts = vec![0.0; ORDER_BUCKETS.len()];
            for _ in 0..ORDERS {
                let v: f64 = order_values.sample(&mut *rng);
                let bucket = ORDER_BUCKETS
                    .iter()
                    .position(|(_, upper)| v < *upper)
                    .unwrap_or(ORDER_BUCKETS.len() - 1);
                counts[bucket] += 1.0;
            }
            let names: Vec<&str> = ORDER_BUCKETS.iter().map(|(n, _)| *n).collect();
            unique_argmax(&counts).map(|top| Draft {
                title: "Orders by order value",
                labels: labels(&names),
                answer: names[top].to_string(),
                series: vec![series("Orders", counts)],
                question: "Which order-value range has the most orders?",
            })
        }
        DataShape::Relationship => {
            let slope: f64 = if rng.gen_bool(0.5) {
                rng.gen_range(1.5..4.0)
            } else {
                -rng.gen_range(0.3..0.9)
            };
            let spend: Vec<f64> = (0..WEEKS)
                .map(|_| round_to(rng.gen_range(1_000.0..10_000.0), 50.0))
                .collect();
            let revenue: Vec<f64> = spend
                .iter()
                .map(|s| {
                    let noisy = 12_000.0 + slope * s + rng.gen_range(-800.0..800.0);
                    round_to(noisy.max(0.0), 10.0)
                })
                .collect();
            let r = pearson(&spend, &revenue);
            let direction = if r > 0.0 {
                Some("positive")
            } else if r < 0.0 {
                Some("negative")
            } else {
                None
            };
            let weeks: Vec<String> = (1..=WEEKS).map(|w| format!("Week {w}")).collect();
            direction.map(|d| Draft {
                title: "Weekly ad spend against revenue",
                labels: weeks,
                series: vec![series("Ad spend", spend), series("Revenue", revenue)],
                question: "Is the relationship between ad spend and revenue positive or negative?",
                answer: d.to_string(),
            })
        }
    };
    Ok(draft)
}

/// Build a seeded dataset for `shape` with a computed answer.
///
/// Answers name the single largest value; a draw whose maximum is shared
/// (or whose correlation is exactly zero) is discarded and drawn again from
/// the same stream.
pub fn generate_challenge(shape: DataShape, seed: u64) -> Result<Challenge, LabError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for attempt in 0..MAX_DRAWS {
        if let Some(d) = draw(shape, &mut rng)? {
            debug!(shape = %shape, seed, attempt, answer = %d.answer, "generated challenge");
            return Ok(Challenge {
                shape,
                seed,
                title: d.title.to_string(),
                labels: d.labels,
                series: d.series,
                question: d.question.to_string(),
                answer: d.answer,
            });
        }
    }
    Err(LabError::InvalidInput(format!(
        "no unambiguous {shape} dataset after {MAX_DRAWS} draws"
    )))
}

/// Grade a chart choice and an answer for a challenge.
pub fn grade_submission(ch: &Challenge, sub: &Submission) -> ChallengeResult {
    let chart = grade_chart(ch.shape, sub.chart);
    let answer_correct = sub.answer.trim().eq_ignore_ascii_case(ch.answer.trim());
    let answer_points = if answer_correct { 40.0 } else { 0.0 };
    let score = (0.6 * f64::from(chart.score) + answer_points).round() as u8;
    ChallengeResult {
        chart,
        answer_correct,
        expected_answer: ch.answer.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_a_best_chart() {
        for shape in DataShape::ALL {
            assert!(!best_for(shape).is_empty(), "{shape}");
        }
        assert_eq!(grade_chart(DataShape::TimeSeries, ChartKind::Line).verdict, Verdict::Best);
        assert_eq!(grade_chart(DataShape::Composition, ChartKind::Pie).score, 100);
        assert_eq!(grade_chart(DataShape::Comparison, ChartKind::Table).score, 60);
        let poor = grade_chart(DataShape::Relationship, ChartKind::Pie);
        assert_eq!(poor.verdict, Verdict::Poor);
        assert!(poor.rationale.contains("scatter"));
    }

    #[test]
    fn parses_names_leniently() {
        assert_eq!("Time Series".parse::<DataShape>().unwrap(), DataShape::TimeSeries);
        assert_eq!("stacked-bar".parse::<ChartKind>().unwrap(), ChartKind::StackedBar);
        assert!("radar".parse::<ChartKind>().is_err());
    }

    #[test]
    fn challenges_are_reproducible_and_consistent() {
        for shape in DataShape::ALL {
            let a = generate_challenge(shape, 17).unwrap();
            assert_eq!(a, generate_challenge(shape, 17).unwrap());
            assert!(!a.answer.is_empty());
            for s in &a.series {
                assert_eq!(s.values.len(), a.labels.len(), "{shape}");
            }
        }
    }

    #[test]
    fn time_series_answer_is_the_peak_month() {
        let ch = generate_challenge(DataShape::TimeSeries, 3).unwrap();
        let values = &ch.series[0].values;
        let peak = values.iter().cloned().fold(f64::MIN, f64::max);
        let idx = values.iter().position(|v| *v == peak).unwrap();
        assert_eq!(ch.labels[idx], ch.answer);
    }

    #[test]
    fn shared_maximum_has_no_answer() {
        assert_eq!(unique_argmax(&[1.0, 3.0, 2.0]), Some(1));
        assert_eq!(unique_argmax(&[4.0, 1.0, 4.0]), None);
        assert_eq!(unique_argmax(&[]), None);
    }

    #[test]
    fn answers_name_a_strict_maximum() {
        for shape in [DataShape::TimeSeries, DataShape::Composition, DataShape::Distribution] {
            for seed in 0..40 {
                let ch = generate_challenge(shape, seed).unwrap();
                let values = &ch.series[0].values;
                let idx = ch.labels.iter().position(|l| *l == ch.answer).unwrap();
                let above = values.iter().filter(|v| **v >= values[idx]).count();
                assert_eq!(above, 1, "{shape} seed {seed}");
            }
        }
    }

    #[test]
    fn distribution_counts_every_order() {
        for seed in 0..20 {
            let ch = generate_challenge(DataShape::Distribution, seed).unwrap();
            let total: f64 = ch.series[0].values.iter().sum();
            assert_eq!(total, ORDERS as f64);
        }
    }

    #[test]
    fn relationship_answer_matches_correlation() {
        for seed in 0..10 {
            let ch = generate_challenge(DataShape::Relationship, seed).unwrap();
            let r = pearson(&ch.series[0].values, &ch.series[1].values);
            let expected = if r > 0.0 { "positive" } else { "negative" };
            assert_eq!(ch.answer, expected);
        }
    }

    #[test]
    fn submission_scoring_weights_chart_and_answer() {
        let ch = generate_challenge(DataShape::Comparison, 5).unwrap();
        let perfect = grade_submission(
            &ch,
            &Submission {
                chart: ChartKind::Bar,
                answer: format!("  {}  ", ch.answer.to_uppercase()),
            },
        );
        assert!(perfect.answer_correct);
        assert_eq!(perfect.score, 100);

        let wrong = grade_submission(
            &ch,
            &Submission {
                chart: ChartKind::Pie,
                answer: "nobody".into(),
            },
        );
        assert!(!wrong.answer_correct);
        assert_eq!(wrong.score, 12);
        assert_eq!(wrong.expected_answer, ch.answer);
    }
}
