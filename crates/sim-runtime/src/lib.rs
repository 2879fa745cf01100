#![deny(warnings)]

//! Orchestration: simulate a campaign, grade it, ask a feedback provider for
//! narration and store everything.

pub mod config;
pub mod scenario;

pub use config::{FeedbackSettings, RuntimeConfig};
pub use scenario::{load_ab_test, load_campaign, load_seo_edit};

use anyhow::{anyhow, Context, Result};
use persistence::{NewFeedback, RunCampaign, SqlitePool};
use serde::Serialize;
use sim_ads::Benchmark;
use sim_ai::{FeedbackPrompt, FeedbackProvider, Insight, RuleBasedNarrator, ScoreCard};
use sim_core::{AbTest, AbTestResult, Campaign, Simulation};
use tracing::{info, instrument};

/// Everything produced by one campaign run.
#[derive(Clone, Debug, Serialize)]
pub struct CampaignReport {
    pub simulation: Simulation,
    pub benchmark: Benchmark,
    pub score: ScoreCard,
    pub insights: Vec<Insight>,
    pub prompt: FeedbackPrompt,
    pub provider: String,
    pub feedback: String,
}

/// Ids of the rows written for a run.
#[derive(Clone, Debug, Serialize)]
pub struct PersistedRun {
    pub campaign_id: i64,
    pub simulation_id: i64,
    pub feedback_id: i64,
    pub report: CampaignReport,
}

#[derive(Clone, Debug, Serialize)]
pub struct PersistedAbTest {
    pub id: i64,
    pub result: AbTestResult,
    pub prompt: FeedbackPrompt,
}

/// The offline narrator configured from runtime settings.
pub fn default_provider(cfg: &RuntimeConfig) -> RuleBasedNarrator {
    RuleBasedNarrator {
        max_points: cfg.feedback.max_points,
    }
}

/// Simulate, grade and narrate a campaign without touching storage.
#[instrument(skip_all, fields(campaign = %c.name, seed = cfg.seed))]
pub fn run_campaign(
    c: &Campaign,
    cfg: &RuntimeConfig,
    provider: &dyn FeedbackProvider,
) -> Result<CampaignReport> {
    let simulation = sim_ads::simulate(c, &cfg.sim_config())
        .with_context(|| format!("simulating {}", c.name))?;
    let benchmark = sim_ads::benchmark(c.platform, c.industry);
    let score = sim_ai::score_card(&simulation, &benchmark, &cfg.feedback.weights);
    let insights = sim_ai::analyze(c, &simulation);
    let prompt = sim_ai::build_prompt(c, &simulation, &insights);
    let feedback = provider
        .narrate(&prompt, &insights)
        .with_context(|| format!("narrating with {}", provider.name()))?;
    info!(
        grade = %score.grade,
        insights = insights.len(),
        provider = provider.name(),
        "campaign report ready"
    );
    Ok(CampaignReport {
        simulation,
        benchmark,
        score,
        insights,
        prompt,
        provider: provider.name().to_string(),
        feedback,
    })
}

async fn persist_report(
    pool: &SqlitePool,
    campaign: RunCampaign<'_>,
    cfg: &RuntimeConfig,
    report: CampaignReport,
) -> Result<PersistedRun> {
    let feedback = NewFeedback {
        provider: &report.provider,
        grade: report.score.grade,
        insights: &report.insights,
        body: &report.feedback,
    };
    let ids = persistence::record_run(pool, campaign, &report.simulation, cfg.noise_frac, &feedback)
        .await?;
    info!(
        campaign_id = ids.campaign_id,
        simulation_id = ids.simulation_id,
        feedback_id = ids.feedback_id,
        "run persisted"
    );
    Ok(PersistedRun {
        campaign_id: ids.campaign_id,
        simulation_id: ids.simulation_id,
        feedback_id: ids.feedback_id,
        report,
    })
}

/// Full flow: run a campaign, then store it with the run and its feedback
/// in one transaction.
pub async fn run_and_persist(
    pool: &SqlitePool,
    c: &Campaign,
    cfg: &RuntimeConfig,
    provider: &dyn FeedbackProvider,
) -> Result<PersistedRun> {
    let report = run_campaign(c, cfg, provider)?;
    persist_report(pool, RunCampaign::New(c), cfg, report).await
}

/// Load a stored campaign and run it again, e.g. with a different seed.
pub async fn resimulate(
    pool: &SqlitePool,
    campaign_id: i64,
    cfg: &RuntimeConfig,
    provider: &dyn FeedbackProvider,
) -> Result<PersistedRun> {
    let stored = persistence::get_campaign(pool, campaign_id)
        .await?
        .ok_or_else(|| anyhow!("campaign {campaign_id} not found"))?;
    let report = run_campaign(&stored.campaign, cfg, provider)?;
    persist_report(pool, RunCampaign::Existing(campaign_id), cfg, report).await
}

/// Run an A/B test with the configured seed and store it.
pub async fn run_ab_test_and_persist(
    pool: &SqlitePool,
    t: &AbTest,
    cfg: &RuntimeConfig,
) -> Result<PersistedAbTest> {
    let result =
        sim_labs::run_ab_test(t, cfg.seed).with_context(|| format!("running {}", t.name))?;
    let id = persistence::record_ab_test(pool, t, &result).await?;
    let prompt = sim_ai::build_ab_prompt(t, &result);
    info!(id, winner = result.winner.as_deref().unwrap_or("none"), "a/b test persisted");
    Ok(PersistedAbTest { id, result, prompt })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_ai::FeedbackError;
    use std::path::Path;

    fn campaign(name: &str) -> Campaign {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/scenarios")
            .join(name);
        load_campaign(path).unwrap()
    }

    fn config() -> RuntimeConfig {
        RuntimeConfig {
            database_url: "sqlite::memory:".into(),
            ..RuntimeConfig::default()
        }
    }

    struct Failing;

    impl FeedbackProvider for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn narrate(&self, _: &FeedbackPrompt, _: &[Insight]) -> Result<String, FeedbackError> {
            Err(FeedbackError::Narration("offline".into()))
        }
    }

    #[test]
    fn report_is_reproducible() {
        let c = campaign("google_search.yaml");
        let cfg = config();
        let provider = default_provider(&cfg);
        let a = run_campaign(&c, &cfg, &provider).unwrap();
        let b = run_campaign(&c, &cfg, &provider).unwrap();
        assert_eq!(a.simulation, b.simulation);
        assert_eq!(a.feedback, b.feedback);
        assert_eq!(a.simulation.days.len(), 30);
        assert_eq!(a.provider, "rule_based");
        assert!(a.prompt.user.contains("Holiday gift search"));
    }

    #[test]
    fn provider_failures_surface() {
        let c = campaign("linkedin_leads.yaml");
        let err = run_campaign(&c, &config(), &Failing).unwrap_err();
        assert!(format!("{err:#}").contains("offline"));
    }

    #[tokio::test]
    async fn persisted_runs_can_be_replayed() {
        let cfg = config();
        let pool = persistence::init_db(&cfg.database_url).await.unwrap();
        let provider = default_provider(&cfg);
        let c = campaign("linkedin_leads.yaml");

        let first = run_and_persist(&pool, &c, &cfg, &provider).await.unwrap();
        let again = RuntimeConfig { seed: 7, ..cfg.clone() };
        let second = resimulate(&pool, first.campaign_id, &again, &provider).await.unwrap();
        assert_eq!(second.campaign_id, first.campaign_id);
        assert_ne!(second.simulation_id, first.simulation_id);

        let runs = persistence::simulations_for_campaign(&pool, first.campaign_id)
            .await
            .unwrap();
        assert_eq!(runs.iter().map(|r| r.seed).collect::<Vec<_>>(), vec![42, 7]);
        let fb = persistence::feedback_for_simulation(&pool, second.simulation_id)
            .await
            .unwrap();
        assert_eq!(fb[0].grade, second.report.score.grade);
        assert_eq!(fb[0].id, second.feedback_id);

        assert!(resimulate(&pool, 404, &cfg, &provider).await.is_err());
        let stored = persistence::list_campaigns(&pool).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].simulations, 2);
    }

    #[tokio::test]
    async fn ab_tests_are_stored() {
        let cfg = config();
        let pool = persistence::init_db(&cfg.database_url).await.unwrap();
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../assets/scenarios/meta_headline_test.yaml");
        let t = load_ab_test(path).unwrap();
        let run = run_ab_test_and_persist(&pool, &t, &cfg).await.unwrap();
        let stored = persistence::get_ab_test(&pool, run.id).await.unwrap().unwrap();
        assert_eq!(stored.result, run.result);
        assert!(run.prompt.user.contains("Summer sale headline test"));
    }
}
