//! Simulated A/B tests over ad copy variants.

use crate::stats::{critical_z, normal_quantile, two_proportion_test};
use crate::LabError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Binomial, Distribution};
use sim_ads::{benchmark, score_copy};
use sim_core::{validate_ab_test, AbMetric, AbTest, AbTestResult, VariantResult};
use tracing::{debug, info, warn};

/// Lowest and highest copy multiplier applied to the benchmark rate.
const COPY_FLOOR: f64 = 0.7;
const COPY_SPAN: f64 = 0.6;

struct Observed {
    copy_score: f64,
    samples: u64,
    successes: u64,
}

/// Run a seeded A/B test and evaluate every variant against the control.
pub fn run_ab_test(t: &AbTest, seed: u64) -> Result<AbTestResult, LabError> {
    validate_ab_test(t)?;

    let bench = benchmark(t.platform, t.industry);
    let base_rate = match t.metric {
        AbMetric::Ctr => bench.ctr,
        AbMetric::ConversionRate => bench.cvr,
    };
    let impressions = t.daily_traffic.saturating_mul(u64::from(t.days)) / t.variants.len() as u64;
    let samples = match t.metric {
        AbMetric::Ctr => impressions,
        AbMetric::ConversionRate => (impressions as f64 * bench.ctr).round() as u64,
    };
    if samples == 0 {
        return Err(LabError::InvalidInput(format!(
            "{} variants leave no samples per variant",
            t.variants.len()
        )));
    }
    let z_crit = critical_z(t.confidence)
        .ok_or_else(|| LabError::InvalidInput(format!("confidence {}", t.confidence)))?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut observed = Vec::with_capacity(t.variants.len());
    for v in &t.variants {
        let copy_score = score_copy(
            &v.headline,
            &v.description,
            v.call_to_action.as_deref(),
            t.platform,
            &[],
        )
        .total;
        let true_rate = (base_rate * (COPY_FLOOR + COPY_SPAN * copy_score)).clamp(1e-6, 0.99);
        let dist = Binomial::new(samples, true_rate)
            .map_err(|e| LabError::InvalidInput(format!("binomial({samples}, {true_rate}): {e}")))?;
        let successes = dist.sample(&mut rng);
        debug!(variant = %v.name, copy_score, true_rate, samples, successes, "sampled variant");
        observed.push(Observed {
            copy_score,
            samples,
            successes,
        });
    }

    let control_idx = t
        .variants
        .iter()
        .position(|v| v.is_control)
        .ok_or_else(|| LabError::InvalidInput("missing control".into()))?;
    let control = &observed[control_idx];
    let control_rate = control.successes as f64 / control.samples as f64;
    if control.successes == 0 {
        warn!(test = %t.name, "control recorded no successes; lift is undefined");
    }

    let alpha = 1.0 - t.confidence;
    let variants: Vec<VariantResult> = t
        .variants
        .iter()
        .zip(&observed)
        .map(|(v, o)| {
            let rate = o.successes as f64 / o.samples as f64;
            let (z_score, p_value) = if v.is_control {
                (0.0, 1.0)
            } else {
                two_proportion_test(control.successes, control.samples, o.successes, o.samples)
            };
            let lift = if control_rate > 0.0 {
                (rate - control_rate) / control_rate
            } else {
                0.0
            };
            let half_width = z_crit * (rate * (1.0 - rate) / o.samples as f64).sqrt();
            VariantResult {
                name: v.name.clone(),
                is_control: v.is_control,
                copy_score: o.copy_score,
                samples: o.samples,
                successes: o.successes,
                rate,
                lift,
                z_score,
                p_value,
                significant: !v.is_control && p_value < alpha,
                ci_low: (rate - half_width).max(0.0),
                ci_high: (rate + half_width).min(1.0),
            }
        })
        .collect();

    let winner = pick_winner(&variants, control_rate);

    info!(
        test = %t.name,
        metric = t.metric.as_str(),
        variants = variants.len(),
        samples,
        winner = winner.as_deref().unwrap_or("none"),
        "a/b test complete"
    );

    Ok(AbTestResult {
        test_name: t.name.clone(),
        metric: t.metric,
        seed,
        variants,
        winner,
    })
}

/// The significant variant with the highest rate above the control.
///
/// Ranks on rate rather than lift so a control with no successes, whose lift
/// is undefined and reported as 0, can still be beaten.
fn pick_winner(variants: &[VariantResult], control_rate: f64) -> Option<String> {
    variants
        .iter()
        .filter(|v| v.significant && v.rate > control_rate)
        .max_by(|a, b| a.rate.total_cmp(&b.rate))
        .map(|v| v.name.clone())
}

/// Samples needed per variant to detect a relative lift `mde` over `baseline`.
pub fn required_sample_size(
    baseline: f64,
    mde: f64,
    confidence: f64,
    power: f64,
) -> Result<u64, LabError> {
    let target = baseline * (1.0 + mde);
    if !(baseline > 0.0 && baseline < 1.0) || !(target > 0.0 && target < 1.0) || mde == 0.0 {
        return Err(LabError::InvalidInput(format!(
            "baseline {baseline} with lift {mde} is not a valid rate pair"
        )));
    }
    let z_alpha = critical_z(confidence)
        .filter(|_| confidence > 0.5)
        .ok_or_else(|| LabError::InvalidInput(format!("confidence {confidence}")))?;
    let z_beta = normal_quantile(power)
        .filter(|_| power > 0.5)
        .ok_or_else(|| LabError::InvalidInput(format!("power {power}")))?;

    let mean = (baseline + target) / 2.0;
    let pooled = z_alpha * (2.0 * mean * (1.0 - mean)).sqrt();
    let separate = z_beta * (baseline * (1.0 - baseline) + target * (1.0 - target)).sqrt();
    let n = (pooled + separate).powi(2) / (target - baseline).powi(2);
    Ok(n.ceil() as u64)
}
