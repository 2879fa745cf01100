//! A/B test definitions and results.

use crate::{Industry, Platform, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rate an A/B test compares between variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbMetric {
    /// Clicks over impressions.
    Ctr,
    /// Conversions over clicks.
    ConversionRate,
}

impl AbMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            AbMetric::Ctr => "ctr",
            AbMetric::ConversionRate => "conversion_rate",
        }
    }
}

/// One creative alternative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub headline: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub is_control: bool,
}

/// An A/B test over ad copy variants with an even traffic split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbTest {
    pub name: String,
    pub platform: Platform,
    pub industry: Industry,
    pub metric: AbMetric,
    pub variants: Vec<Variant>,
    /// Impressions per day across all variants.
    pub daily_traffic: u64,
    pub days: u16,
    /// Confidence level for significance, e.g. 0.95.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    0.95
}

impl AbTest {
    /// The single control variant, if the test is well formed.
    pub fn control(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| v.is_control)
    }
}

/// Observed outcome for one variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    pub name: String,
    pub is_control: bool,
    /// Copy heuristic in [0, 1].
    pub copy_score: f64,
    /// Impressions (CTR) or clicks (conversion rate) observed.
    pub samples: u64,
    pub successes: u64,
    pub rate: f64,
    /// Relative change of the rate against the control.
    pub lift: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub significant: bool,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Outcome of a simulated A/B test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbTestResult {
    pub test_name: String,
    pub metric: AbMetric,
    pub seed: u64,
    pub variants: Vec<VariantResult>,
    /// Name of the variant that significantly beat the control.
    pub winner: Option<String>,
}

/// Validate the shape of an A/B test.
pub fn validate_ab_test(t: &AbTest) -> Result<(), ValidationError> {
    if t.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if t.variants.len() < 2 {
        return Err(ValidationError::AbTestShape(
            "at least two variants are required".into(),
        ));
    }
    let controls = t.variants.iter().filter(|v| v.is_control).count();
    if controls != 1 {
        return Err(ValidationError::AbTestShape(format!(
            "exactly one control is required, found {controls}"
        )));
    }
    let mut names = BTreeSet::new();
    for v in &t.variants {
        if v.name.trim().is_empty() || v.headline.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !names.insert(v.name.as_str()) {
            return Err(ValidationError::AbTestShape(format!(
                "duplicate variant name {}",
                v.name
            )));
        }
    }
    if t.daily_traffic == 0 || t.days == 0 {
        return Err(ValidationError::AbTestShape(
            "traffic and duration must be positive".into(),
        ));
    }
    if !(t.confidence > 0.5 && t.confidence < 1.0) {
        return Err(ValidationError::AbTestShape(format!(
            "confidence {} outside (0.5, 1)",
            t.confidence
        )));
    }
    Ok(())
}
