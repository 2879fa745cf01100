//! Plain-text rendering of command results.

use persistence::{CampaignRow, FeedbackRow, SimulationRow};
use sim_core::AbTestResult;
use sim_labs::quiz::choice_letter;
use sim_labs::{Challenge, ChallengeResult, Quiz, QuizResult, SeoOutcome};
use sim_runtime::CampaignReport;

pub fn report(r: &CampaignReport) {
    let sim = &r.simulation;
    let s = &sim.summary;
    println!(
        "{} | {} {} | {} days | seed {}",
        sim.campaign_name, sim.platform, sim.industry, s.days, sim.seed
    );
    println!(
        "Quality score {}/10 | grade {} (utility {:.2})",
        sim.quality_score, r.score.grade, r.score.utility
    );
    println!(
        "Impressions {} | clicks {} | conversions {}",
        s.impressions, s.clicks, s.conversions
    );
    println!(
        "CTR {:.2}% | avg CPC ${} | conv. rate {:.2}% | spend ${} ({:.0}% of budget)",
        s.ctr * 100.0,
        s.avg_cpc,
        s.conversion_rate * 100.0,
        s.cost,
        s.budget_utilization * 100.0
    );
    match (s.cpa, s.roas) {
        (Some(cpa), Some(roas)) => println!("CPA ${cpa} | ROAS {roas:.2}x"),
        (Some(cpa), None) => println!("CPA ${cpa}"),
        _ => {}
    }
    println!();
    println!("{}", r.feedback);
}

pub fn ab_result(r: &AbTestResult) {
    println!("{} ({})", r.test_name, r.metric.as_str());
    for v in &r.variants {
        let mark = if v.is_control {
            "control"
        } else if v.significant {
            "significant"
        } else {
            ""
        };
        println!(
            "  {:<12} {:>7.3}% [{:.3}%, {:.3}%] lift {:>+6.1}% p={:.4} {}",
            v.name,
            v.rate * 100.0,
            v.ci_low * 100.0,
            v.ci_high * 100.0,
            v.lift * 100.0,
            v.p_value,
            mark
        );
    }
    match &r.winner {
        Some(w) => println!("Winner: {w}"),
        None => println!("No significant winner"),
    }
}

pub fn seo_outcome(o: &SeoOutcome) {
    println!(
        "Score {} -> {} | rank {} -> {} | monthly clicks {} -> {} ({:+})",
        o.before.score,
        o.after.score,
        o.rank_before,
        o.rank_after,
        o.clicks_before,
        o.clicks_after,
        o.click_change()
    );
    for i in &o.issues_fixed {
        println!("  fixed: {i}");
    }
    for i in &o.issues_introduced {
        println!("  new:   {i}");
    }
    for i in &o.after.issues {
        println!("  open:  {i}");
    }
}

pub fn challenge(c: &Challenge) {
    println!("{} ({} data, seed {})", c.title, c.shape, c.seed);
    for s in &c.series {
        println!("  {}:", s.name);
        for (label, v) in c.labels.iter().zip(&s.values) {
            println!("    {label:<10} {v:>10.1}");
        }
    }
    println!("Q: {}", c.question);
    println!(
        "Answer with: adlab dataviz {} --seed {} --chart <kind> --answer <text>",
        c.shape, c.seed
    );
}

pub fn challenge_result(r: &ChallengeResult) {
    println!("Chart: {} ({})", r.chart.score, r.chart.rationale);
    if r.answer_correct {
        println!("Answer: correct");
    } else {
        println!("Answer: incorrect, expected {}", r.expected_answer);
    }
    println!("Score: {}/100", r.score);
}

pub fn quiz(q: &Quiz) {
    let topic = q.topic.map_or_else(|| "all topics".to_string(), |t| t.to_string());
    println!("Quiz: {} questions, {topic}, seed {}", q.questions.len(), q.seed);
    for (n, question) in q.questions.iter().enumerate() {
        println!("\n{}. {}", n + 1, question.prompt);
        for (i, choice) in question.choices.iter().enumerate() {
            println!("   {}) {choice}", choice_letter(i));
        }
    }
    let topic_flag = q.topic.map(|t| format!(" --topic {t}")).unwrap_or_default();
    println!(
        "\nAnswer with: adlab quiz{topic_flag} --count {} --seed {} --answers <a,b,...>",
        q.questions.len(),
        q.seed
    );
}

pub fn quiz_result(r: &QuizResult) {
    for (n, a) in r.answers.iter().enumerate() {
        let given = a.given.as_deref().unwrap_or("-");
        if a.correct {
            println!("{}. {given}: correct", n + 1);
        } else {
            println!("{}. {given}: wrong, expected {}. {}", n + 1, a.expected, a.explanation);
        }
    }
    let verdict = if r.passed { "passed" } else { "not passed" };
    println!("Score: {}/{} ({}%) {verdict}", r.correct, r.total, r.score);
}

pub fn campaigns(rows: &[CampaignRow]) {
    if rows.is_empty() {
        println!("No campaigns stored yet");
        return;
    }
    for c in rows {
        println!(
            "#{:<4} {:<30} {:<9} {:<12} runs {:<3} {}",
            c.id, c.name, c.platform, c.industry, c.simulations, c.created_at
        );
    }
}

pub fn history(runs: &[(SimulationRow, Vec<FeedbackRow>)]) {
    if runs.is_empty() {
        println!("No simulations for this campaign");
        return;
    }
    for (run, feedback) in runs {
        let s = &run.summary;
        let grade = feedback
            .last()
            .map(|f| f.grade.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "run #{:<4} seed {:<6} QS {:>2} grade {} | clicks {:>7} conv {:>5} spend ${} | {}",
            run.id,
            run.seed,
            run.quality_score,
            grade,
            s.clicks,
            s.conversions,
            s.cost,
            run.created_at
        );
    }
}
