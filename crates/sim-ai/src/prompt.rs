//! Prompt assembly for an external language model.

use crate::insights::Insight;
use serde::{Deserialize, Serialize};
use sim_ads::benchmark;
use sim_core::{AbTest, AbTestResult, BidStrategy, Campaign, Simulation};

const COACH_SYSTEM: &str = "You are a digital marketing coach reviewing a student's \
simulated ad campaign. Explain what the numbers mean in plain language, tie every \
recommendation to a metric, and finish with the single most important change to make next. \
Keep it under 250 words.";

const AB_SYSTEM: &str = "You are a digital marketing coach explaining the result of a \
simulated A/B test. Say whether the test found a winner, what the confidence interval means, \
and what to test next. Do not claim significance the data does not support. \
Keep it under 200 words.";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackPrompt {
    pub system: String,
    pub user: String,
}

fn bid_label(b: &BidStrategy) -> String {
    match b {
        BidStrategy::ManualCpc { max_cpc } => format!("manual CPC (max ${max_cpc})"),
        BidStrategy::MaximizeClicks => "maximize clicks".into(),
        BidStrategy::MaximizeConversions => "maximize conversions".into(),
        BidStrategy::TargetCpa { target_cpa } => format!("target CPA (${target_cpa})"),
    }
}

/// Prompt describing a campaign run, its benchmark and the rule findings.
pub fn build_prompt(c: &Campaign, sim: &Simulation, insights: &[Insight]) -> FeedbackPrompt {
    let s = &sim.summary;
    let b = benchmark(c.platform, c.industry);
    let mut lines = vec![
        format!("Campaign: {}", c.name),
        format!(
            "Platform: {} | Industry: {} | Goal: {:?}",
            c.platform, c.industry, c.goal
        ),
        format!(
            "Budget: ${}/day for {} days | Bidding: {}",
            c.daily_budget,
            c.duration_days,
            bid_label(&c.bid_strategy)
        ),
    ];
    if !c.ad_copy.headlines.is_empty() {
        lines.push(format!("Headlines: {}", c.ad_copy.headlines.join(" | ")));
    }
    if !c.keywords.is_empty() {
        let kws: Vec<&str> = c.keywords.iter().map(|k| k.text.as_str()).collect();
        lines.push(format!("Keywords: {}", kws.join(", ")));
    }
    lines.push(String::new());
    lines.push(format!("Quality score: {}/10", sim.quality_score));
    lines.push(format!(
        "Impressions: {} | Clicks: {} | Conversions: {}",
        s.impressions, s.clicks, s.conversions
    ));
    lines.push(format!(
        "CTR: {:.2}% (benchmark {:.2}%) | Avg CPC: ${} (benchmark ${:.2})",
        s.ctr * 100.0,
        b.ctr * 100.0,
        s.avg_cpc,
        b.cpc,
    ));
    lines.push(format!(
        "Conversion rate: {:.2}% (benchmark {:.2}%)",
        s.conversion_rate * 100.0,
        b.cvr * 100.0
    ));
    let mut money = format!(
        "Spend: ${} ({:.0}% of budget)",
        s.cost,
        s.budget_utilization * 100.0
    );
    if let Some(cpa) = s.cpa {
        money.push_str(&format!(" | CPA: ${cpa}"));
    }
    if let Some(roas) = s.roas {
        money.push_str(&format!(" | ROAS: {roas:.2}x"));
    }
    lines.push(money);

    if !insights.is_empty() {
        lines.push(String::new());
        lines.push("Findings:".into());
        lines.extend(insights.iter().map(|i| format!("- {i}")));
    }
    lines.push(String::new());
    lines.push("Write feedback for the student.".into());

    FeedbackPrompt {
        system: COACH_SYSTEM.into(),
        user: lines.join("\n"),
    }
}

/// Prompt describing an A/B test outcome.
pub fn build_ab_prompt(t: &AbTest, r: &AbTestResult) -> FeedbackPrompt {
    let mut lines = vec![
        format!("A/B test: {}", t.name),
        format!(
            "Platform: {} | Metric: {} | {} impressions/day for {} days | confidence {:.0}%",
            t.platform,
            r.metric.as_str(),
            t.daily_traffic,
            t.days,
            t.confidence * 100.0
        ),
        String::new(),
    ];
    for (v, res) in t.variants.iter().zip(&r.variants) {
        let role = if res.is_control { "control" } else { "variant" };
        lines.push(format!("{} ({role}): \"{}\"", res.name, v.headline));
        lines.push(format!(
            "  rate {:.3}% [{:.3}%, {:.3}%] from {} of {} | lift {:+.1}% | p = {:.4}",
            res.rate * 100.0,
            res.ci_low * 100.0,
            res.ci_high * 100.0,
            res.successes,
            res.samples,
            res.lift * 100.0,
            res.p_value
        ));
    }
    lines.push(String::new());
    lines.push(match &r.winner {
        Some(w) => format!("Winner: {w}"),
        None => "No variant beat the control significantly.".into(),
    });

    FeedbackPrompt {
        system: AB_SYSTEM.into(),
        user: lines.join("\n"),
    }
}
