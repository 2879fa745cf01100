use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;
use sim_core::{
    AdCopy, BidStrategy, Campaign, CampaignGoal, Industry, Keyword, MatchType, Platform,
    SimConfig, Targeting,
};

fn build_campaign(n_keywords: usize) -> Campaign {
    let keywords = (0..n_keywords)
        .map(|i| Keyword {
            text: format!("project tool {i}"),
            match_type: if i % 2 == 0 {
                MatchType::Phrase
            } else {
                MatchType::Broad
            },
        })
        .collect();
    Campaign {
        name: "Bench".into(),
        platform: Platform::Google,
        industry: Industry::Saas,
        goal: CampaignGoal::Leads,
        daily_budget: Decimal::new(400, 0),
        bid_strategy: BidStrategy::MaximizeConversions,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        duration_days: 365,
        targeting: Targeting::default(),
        keywords,
        ad_copy: AdCopy {
            headlines: vec![
                "Project Tool for Teams".into(),
                "Start Free in 2 Minutes".into(),
                "Trusted by 10k Teams".into(),
            ],
            descriptions: vec!["Plan, track and ship work faster. Try it free today.".into()],
            call_to_action: Some("Start Free Trial".into()),
            display_url: None,
        },
        schedule: None,
        conversion_value: Some(Decimal::new(300, 0)),
    }
}

fn bench_year(c: &mut Criterion) {
    let campaign = build_campaign(20);
    let cfg = SimConfig::default();
    c.bench_function("simulate 365 days x 20 keywords", |b| {
        b.iter(|| {
            let _ = black_box(sim_ads::simulate(&campaign, &cfg));
        })
    });
}

fn bench_factors(c: &mut Criterion) {
    let campaign = build_campaign(50);
    c.bench_function("extract factors", |b| {
        b.iter(|| black_box(sim_ads::extract_factors(&campaign)))
    });
}

criterion_group!(benches, bench_year, bench_factors);
criterion_main!(benches);
