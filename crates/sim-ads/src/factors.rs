//! Heuristic factor extraction from a campaign configuration.
//!
//! Every score is a pure function of the configuration and lies in [0, 1].

use crate::benchmarks::{benchmark, goal_profile};
use crate::metrics::market_cpc;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use sim_core::{BidStrategy, Campaign, Keyword, MatchType, Platform, QualityFactors, Targeting};

const CTA_PHRASES: &[&str] = &[
    "buy", "shop", "get", "start", "try", "learn more", "sign up", "download", "book", "call",
    "join", "discover", "save", "register", "subscribe", "request", "claim", "order",
];

const BENEFIT_WORDS: &[&str] = &[
    "free", "save", "fast", "easy", "new", "guaranteed", "exclusive", "best", "proven", "instant",
    "official", "trusted",
];

/// Breakdown of the copy heuristic for one headline/description pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CopyScore {
    pub length: f64,
    pub call_to_action: f64,
    pub specificity: f64,
    pub benefit: f64,
    pub keyword_presence: f64,
    pub penalties: f64,
    pub total: f64,
}

/// Lowercased alphanumeric tokens of `text`.
pub fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn padded(tokens: &[String]) -> String {
    format!(" {} ", tokens.join(" "))
}

fn has_phrase(padded_text: &str, phrase: &str) -> bool {
    padded_text.contains(&format!(" {phrase} "))
}

fn length_fit(len: usize, limit: usize) -> f64 {
    if len == 0 || len > limit {
        return 0.0;
    }
    let ratio = len as f64 / limit as f64;
    if ratio >= 0.4 {
        1.0
    } else {
        ratio / 0.4
    }
}

fn is_shouting(word: &str) -> bool {
    word.chars().count() >= 3
        && word.chars().all(|c| c.is_alphabetic())
        && word.chars().all(|c| c.is_uppercase())
}

fn keyword_matches(keyword: &Keyword, copy_tokens: &[String]) -> bool {
    let kw = tokens(&keyword.text);
    !kw.is_empty() && kw.iter().all(|t| copy_tokens.contains(t))
}

/// Score one headline/description pair against platform limits and keywords.
pub fn score_copy(
    headline: &str,
    description: &str,
    call_to_action: Option<&str>,
    platform: Platform,
    keywords: &[Keyword],
) -> CopyScore {
    let headline_len = headline.trim().chars().count();
    let description_len = description.trim().chars().count();
    let length = 0.5 * length_fit(headline_len, platform.headline_limit())
        + 0.5 * length_fit(description_len, platform.description_limit());

    let combined = format!("{headline} {description}");
    let copy_tokens = tokens(&combined);
    let text = padded(&copy_tokens);

    let explicit_cta = call_to_action.map(|c| !c.trim().is_empty()).unwrap_or(false);
    let call_to_action = if explicit_cta {
        1.0
    } else if CTA_PHRASES.iter().any(|p| has_phrase(&text, p)) {
        0.7
    } else {
        0.0
    };

    let specificity = if combined
        .chars()
        .any(|c| c.is_ascii_digit() || c == '%' || c == '$')
    {
        1.0
    } else {
        0.0
    };

    let benefit_hits = BENEFIT_WORDS.iter().filter(|w| has_phrase(&text, w)).count();
    let benefit = benefit_hits.min(2) as f64 / 2.0;

    let keyword_presence = if keywords.is_empty() {
        0.5
    } else {
        let hits = keywords
            .iter()
            .filter(|k| keyword_matches(k, &copy_tokens))
            .count();
        hits as f64 / keywords.len() as f64
    };

    let mut penalties = 0.0;
    if combined.matches('!').count() > 1 {
        penalties += 0.15;
    }
    if combined.split_whitespace().filter(|w| is_shouting(w)).count() >= 2 {
        penalties += 0.2;
    }
    if headline_len > platform.headline_limit() || description_len > platform.description_limit() {
        penalties += 0.25;
    }

    let total = (0.25 * length
        + 0.2 * call_to_action
        + 0.15 * specificity
        + 0.15 * benefit
        + 0.25 * keyword_presence
        - penalties)
        .clamp(0.0, 1.0);

    CopyScore {
        length,
        call_to_action,
        specificity,
        benefit,
        keyword_presence,
        penalties,
        total,
    }
}

/// Creative quality: mean copy score over headline/description pairs plus completeness.
pub fn ad_quality(c: &Campaign) -> f64 {
    let headlines: Vec<&str> = c
        .ad_copy
        .headlines
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
        .collect();
    if headlines.is_empty() {
        return 0.0;
    }
    let descriptions = &c.ad_copy.descriptions;
    let cta = c.ad_copy.call_to_action.as_deref();
    let sum: f64 = headlines
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let d = if descriptions.is_empty() {
                ""
            } else {
                descriptions[i % descriptions.len()].as_str()
            };
            score_copy(h, d, cta, c.platform, &c.keywords).total
        })
        .sum();
    let mean = sum / headlines.len() as f64;
    let wanted = c.platform.recommended_headlines();
    let completeness = headlines.len().min(wanted) as f64 / wanted as f64;
    (0.85 * mean + 0.15 * completeness).clamp(0.0, 1.0)
}

/// Keyword relevance for search platforms, audience definition for the others.
pub fn keyword_relevance(c: &Campaign) -> f64 {
    if c.platform.keyword_driven() {
        if c.keywords.is_empty() {
            return 0.2;
        }
        let copy = c
            .ad_copy
            .headlines
            .iter()
            .chain(&c.ad_copy.descriptions)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let copy_tokens = tokens(&copy);
        let hits = c
            .keywords
            .iter()
            .filter(|k| keyword_matches(k, &copy_tokens))
            .count();
        let share = hits as f64 / c.keywords.len() as f64;
        let mix_bonus = if c.keywords.iter().any(|k| k.match_type != MatchType::Broad) {
            0.1
        } else {
            0.0
        };
        return (0.2 + 0.7 * share + mix_bonus).clamp(0.0, 1.0);
    }

    let n = c.targeting.interests.len() + c.targeting.job_titles.len();
    let base = match n {
        0 => 0.3,
        1..=2 => 0.6,
        3..=8 => 0.9,
        _ => 0.7,
    };
    let copy_tokens = tokens(&c.ad_copy.headlines.join(" "));
    let echoed = c
        .targeting
        .interests
        .iter()
        .any(|i| tokens(i).iter().any(|t| copy_tokens.contains(t)));
    if echoed {
        (base + 0.1_f64).min(1.0)
    } else {
        base
    }
}

/// Targeting completeness for a platform.
pub fn targeting_score(t: &Targeting, platform: Platform) -> f64 {
    let locations: f64 = if t.locations.is_empty() { 0.1 } else { 0.25 };

    let width = t.age_max.saturating_sub(t.age_min);
    let age = if width >= 47 {
        0.1
    } else if (10..=35).contains(&width) {
        0.25
    } else {
        0.18
    };

    let detail_count = t.interests.len() + t.job_titles.len();
    let detail = match detail_count {
        0 if platform.keyword_driven() => 0.2,
        0 => 0.05,
        1 => 0.18,
        2..=8 => 0.3,
        9..=15 => 0.18,
        _ => 0.1,
    };

    let devices = if !t.devices.is_empty() && t.targeted_devices().len() < 3 {
        0.1
    } else {
        0.07
    };

    ((locations + age + detail + devices) / 0.9).clamp(0.0, 1.0)
}

/// How competitive the bid strategy is against the market CPC.
pub fn bid_competitiveness(strategy: &BidStrategy, market_cpc: f64, expected_cvr: f64) -> f64 {
    match strategy {
        BidStrategy::ManualCpc { max_cpc } => {
            let bid = max_cpc.to_f64().unwrap_or(0.0);
            if market_cpc <= 0.0 {
                return 1.0;
            }
            (bid / market_cpc / 1.25).clamp(0.0, 1.0)
        }
        BidStrategy::MaximizeClicks => 0.80,
        BidStrategy::MaximizeConversions => 0.85,
        BidStrategy::TargetCpa { target_cpa } => {
            if expected_cvr <= 0.0 || market_cpc <= 0.0 {
                return 0.1;
            }
            let expected_cpa = market_cpc / expected_cvr;
            let target = target_cpa.to_f64().unwrap_or(0.0);
            (target / expected_cpa / 1.25).clamp(0.1, 1.0)
        }
    }
}

/// Extract all factors for a campaign.
pub fn extract_factors(c: &Campaign) -> QualityFactors {
    let b = benchmark(c.platform, c.industry);
    let cpc = market_cpc(c, &b, b.competition);
    let expected_cvr = b.cvr * goal_profile(c.goal).cvr;
    QualityFactors {
        ad_quality: ad_quality(c),
        keyword_relevance: keyword_relevance(c),
        targeting: targeting_score(&c.targeting, c.platform),
        bid_competitiveness: bid_competitiveness(&c.bid_strategy, cpc, expected_cvr),
    }
}

/// Weighted 1..=10 quality score.
pub fn quality_score(f: &QualityFactors) -> u8 {
    let weighted = 0.35 * f.ad_quality + 0.35 * f.keyword_relevance + 0.30 * f.targeting;
    if !weighted.is_finite() {
        return 1;
    }
    let qs = 1.0 + (9.0 * weighted.clamp(0.0, 1.0)).round();
    qs.clamp(1.0, 10.0) as u8
}
