#![deny(warnings)]

//! Persistence layer: SQLite schema and storage of campaigns, simulation
//! runs, feedback and A/B tests.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sim_ai::{Grade, Insight};
use sim_core::{
    AbTest, AbTestResult, Campaign, DailyMetrics, Industry, Platform, QualityFactors, Simulation,
    SimulationSummary,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub use sqlx::sqlite::SqlitePool;

/// Returns the default SQLite URL used for local runs.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./data/adlab.db"
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn db_path(url: &str) -> Option<&Path> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty()).then(|| Path::new(path))
}

/// Open (creating if needed) the database at `url` and apply migrations.
///
/// In-memory URLs get a single long-lived connection so every query sees
/// the same database.
pub async fn init_db(url: &str) -> Result<SqlitePool> {
    let in_memory = is_in_memory(url);
    if !in_memory {
        if let Some(parent) = db_path(url).and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
    }
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("parsing database url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool_opts = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_opts
        .connect_with(opts)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("running migrations")?;
    info!(url, "database ready");
    Ok(pool)
}

fn money(row: &SqliteRow, col: &str) -> Result<Decimal> {
    let s: String = row.try_get(col)?;
    Decimal::from_str(&s).with_context(|| format!("column {col} holds {s:?}"))
}

fn opt_money(row: &SqliteRow, col: &str) -> Result<Option<Decimal>> {
    let s: Option<String> = row.try_get(col)?;
    s.map(|s| Decimal::from_str(&s).with_context(|| format!("column {col} holds {s:?}")))
        .transpose()
}

fn count(row: &SqliteRow, col: &str) -> Result<u64> {
    let v: i64 = row.try_get(col)?;
    u64::try_from(v).with_context(|| format!("column {col} is negative"))
}

fn json<T: serde::de::DeserializeOwned>(row: &SqliteRow, col: &str) -> Result<T> {
    let s: String = row.try_get(col)?;
    serde_json::from_str(&s).with_context(|| format!("decoding {col}"))
}

/// A stored campaign and its id.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredCampaign {
    pub id: i64,
    pub created_at: String,
    pub campaign: Campaign,
}

/// Listing entry for a campaign.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CampaignRow {
    pub id: i64,
    pub name: String,
    pub platform: Platform,
    pub industry: Industry,
    pub simulations: u64,
    pub created_at: String,
}

pub async fn create_campaign(pool: &SqlitePool, c: &Campaign) -> Result<i64> {
    let mut conn = pool.acquire().await.context("acquiring connection")?;
    insert_campaign(&mut *conn, c).await
}

async fn insert_campaign(conn: &mut SqliteConnection, c: &Campaign) -> Result<i64> {
    let config = serde_json::to_string(c).context("encoding campaign")?;
    let id = sqlx::query(
        "INSERT INTO campaigns (name, platform, industry, config_json) VALUES (?, ?, ?, ?)",
    )
    .bind(&c.name)
    .bind(c.platform.as_str())
    .bind(c.industry.as_str())
    .bind(config)
    .execute(&mut *conn)
    .await
    .context("inserting campaign")?
    .last_insert_rowid();
    debug!(id, name = %c.name, "stored campaign");
    Ok(id)
}

pub async fn get_campaign(pool: &SqlitePool, id: i64) -> Result<Option<StoredCampaign>> {
    let row = sqlx::query("SELECT id, config_json, created_at FROM campaigns WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("loading campaign")?;
    row.map(|r| -> Result<StoredCampaign> {
        Ok(StoredCampaign {
            id: r.try_get("id")?,
            created_at: r.try_get("created_at")?,
            campaign: json(&r, "config_json")?,
        })
    })
    .transpose()
}

/// All campaigns, newest first, with their run counts.
pub async fn list_campaigns(pool: &SqlitePool) -> Result<Vec<CampaignRow>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.platform, c.industry, c.created_at, COUNT(s.id) AS simulations
        FROM campaigns c
        LEFT JOIN simulations s ON s.campaign_id = c.id
        GROUP BY c.id
        ORDER BY c.id DESC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("listing campaigns")?;
    rows.iter()
        .map(|r| -> Result<CampaignRow> {
            let platform: String = r.try_get("platform")?;
            let industry: String = r.try_get("industry")?;
            Ok(CampaignRow {
                id: r.try_get("id")?,
                name: r.try_get("name")?,
                platform: serde_json::from_value(serde_json::Value::String(platform))
                    .context("decoding platform")?,
                industry: serde_json::from_value(serde_json::Value::String(industry))
                    .context("decoding industry")?,
                simulations: count(r, "simulations")?,
                created_at: r.try_get("created_at")?,
            })
        })
        .collect()
}

/// Store a simulation's summary and daily rows in one transaction.
pub async fn record_simulation(
    pool: &SqlitePool,
    campaign_id: i64,
    sim: &Simulation,
    noise_frac: f32,
) -> Result<i64> {
    let mut tx = pool.begin().await?;
    let id = insert_simulation(&mut *tx, campaign_id, sim, noise_frac).await?;
    tx.commit().await.context("committing simulation")?;
    Ok(id)
}

async fn insert_simulation(
    conn: &mut SqliteConnection,
    campaign_id: i64,
    sim: &Simulation,
    noise_frac: f32,
) -> Result<i64> {
    let s = &sim.summary;
    let factors = serde_json::to_string(&sim.factors).context("encoding factors")?;
    let id = sqlx::query(
        r#"
        INSERT INTO simulations (
            campaign_id, seed, noise_frac, quality_score, factors_json, days,
            impressions, clicks, conversions, cost, ctr, avg_cpc, conversion_rate,
            cpa, revenue, roas, budget_utilization
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(campaign_id)
    .bind(sim.seed as i64)
    .bind(f64::from(noise_frac))
    .bind(i64::from(sim.quality_score))
    .bind(factors)
    .bind(i64::from(s.days))
    .bind(s.impressions as i64)
    .bind(s.clicks as i64)
    .bind(s.conversions as i64)
    .bind(s.cost.to_string())
    .bind(s.ctr)
    .bind(s.avg_cpc.to_string())
    .bind(s.conversion_rate)
    .bind(s.cpa.map(|d| d.to_string()))
    .bind(s.revenue.map(|d| d.to_string()))
    .bind(s.roas)
    .bind(s.budget_utilization)
    .execute(&mut *conn)
    .await
    .context("inserting simulation")?
    .last_insert_rowid();

    for d in &sim.days {
        sqlx::query(
            r#"
            INSERT INTO daily_metrics (
                simulation_id, day_index, date, impressions, clicks, conversions,
                cost, ctr, cpc, conversion_rate
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(i64::from(d.day_index))
        .bind(d.date.to_string())
        .bind(d.impressions as i64)
        .bind(d.clicks as i64)
        .bind(d.conversions as i64)
        .bind(d.cost.to_string())
        .bind(d.ctr)
        .bind(d.cpc.to_string())
        .bind(d.conversion_rate)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("inserting day {}", d.day_index))?;
    }
    info!(simulation_id = id, campaign_id, days = sim.days.len(), "recorded simulation");
    Ok(id)
}

/// Stored simulation summary without its daily rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationRow {
    pub id: i64,
    pub campaign_id: i64,
    pub seed: u64,
    pub noise_frac: f32,
    pub quality_score: u8,
    pub factors: QualityFactors,
    pub summary: SimulationSummary,
    pub created_at: String,
}

fn simulation_from_row(r: &SqliteRow) -> Result<SimulationRow> {
    let seed: i64 = r.try_get("seed")?;
    let noise: f64 = r.try_get("noise_frac")?;
    let qs: i64 = r.try_get("quality_score")?;
    let days: i64 = r.try_get("days")?;
    Ok(SimulationRow {
        id: r.try_get("id")?,
        campaign_id: r.try_get("campaign_id")?,
        seed: seed as u64,
        noise_frac: noise as f32,
        quality_score: u8::try_from(qs).context("quality score out of range")?,
        factors: json(r, "factors_json")?,
        summary: SimulationSummary {
            days: u16::try_from(days).context("day count out of range")?,
            impressions: count(r, "impressions")?,
            clicks: count(r, "clicks")?,
            conversions: count(r, "conversions")?,
            cost: money(r, "cost")?,
            ctr: r.try_get("ctr")?,
            avg_cpc: money(r, "avg_cpc")?,
            conversion_rate: r.try_get("conversion_rate")?,
            cpa: opt_money(r, "cpa")?,
            revenue: opt_money(r, "revenue")?,
            roas: r.try_get("roas")?,
            budget_utilization: r.try_get("budget_utilization")?,
        },
        created_at: r.try_get("created_at")?,
    })
}

/// Runs of a campaign, oldest first.
pub async fn simulations_for_campaign(
    pool: &SqlitePool,
    campaign_id: i64,
) -> Result<Vec<SimulationRow>> {
    let rows = sqlx::query("SELECT * FROM simulations WHERE campaign_id = ? ORDER BY id")
        .bind(campaign_id)
        .fetch_all(pool)
        .await
        .context("loading simulations")?;
    rows.iter().map(simulation_from_row).collect()
}

pub async fn get_simulation(pool: &SqlitePool, id: i64) -> Result<Option<SimulationRow>> {
    let row = sqlx::query("SELECT * FROM simulations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("loading simulation")?;
    row.as_ref().map(simulation_from_row).transpose()
}

/// Daily rows of a simulation in day order.
pub async fn daily_metrics(pool: &SqlitePool, simulation_id: i64) -> Result<Vec<DailyMetrics>> {
    let rows = sqlx::query("SELECT * FROM daily_metrics WHERE simulation_id = ? ORDER BY day_index")
        .bind(simulation_id)
        .fetch_all(pool)
        .await
        .context("loading daily metrics")?;
    rows.iter()
        .map(|r| -> Result<DailyMetrics> {
            let date: String = r.try_get("date")?;
            let day_index: i64 = r.try_get("day_index")?;
            Ok(DailyMetrics {
                date: NaiveDate::from_str(&date).map_err(|e| anyhow!("bad date {date:?}: {e}"))?,
                day_index: u16::try_from(day_index).context("day index out of range")?,
                impressions: count(r, "impressions")?,
                clicks: count(r, "clicks")?,
                conversions: count(r, "conversions")?,
                cost: money(r, "cost")?,
                ctr: r.try_get("ctr")?,
                cpc: money(r, "cpc")?,
                conversion_rate: r.try_get("conversion_rate")?,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedbackRow {
    pub id: i64,
    pub simulation_id: i64,
    pub provider: String,
    pub grade: Grade,
    pub insights: Vec<Insight>,
    pub body: String,
    pub created_at: String,
}

/// Coach feedback to store alongside a run.
#[derive(Clone, Copy, Debug)]
pub struct NewFeedback<'a> {
    pub provider: &'a str,
    pub grade: Grade,
    pub insights: &'a [Insight],
    pub body: &'a str,
}

pub async fn record_feedback(
    pool: &SqlitePool,
    simulation_id: i64,
    provider: &str,
    grade: Grade,
    insights: &[Insight],
    body: &str,
) -> Result<i64> {
    let mut conn = pool.acquire().await.context("acquiring connection")?;
    let fb = NewFeedback {
        provider,
        grade,
        insights,
        body,
    };
    insert_feedback(&mut *conn, simulation_id, &fb).await
}

async fn insert_feedback(
    conn: &mut SqliteConnection,
    simulation_id: i64,
    fb: &NewFeedback<'_>,
) -> Result<i64> {
    let insights_json = serde_json::to_string(fb.insights).context("encoding insights")?;
    let id = sqlx::query(
        "INSERT INTO feedback (simulation_id, provider, grade, insights_json, body)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(simulation_id)
    .bind(fb.provider)
    .bind(fb.grade.as_str())
    .bind(insights_json)
    .bind(fb.body)
    .execute(&mut *conn)
    .await
    .context("inserting feedback")?
    .last_insert_rowid();
    debug!(id, simulation_id, provider = fb.provider, grade = %fb.grade, "stored feedback");
    Ok(id)
}

/// Which campaign a run belongs to.
#[derive(Clone, Copy, Debug)]
pub enum RunCampaign<'a> {
    /// Store this campaign first and attach the run to it.
    New(&'a Campaign),
    /// Attach the run to an already stored campaign.
    Existing(i64),
}

/// Row ids written by [`record_run`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RunIds {
    pub campaign_id: i64,
    pub simulation_id: i64,
    pub feedback_id: i64,
}

/// Store a run with its feedback, and its campaign when new, in one
/// transaction. Nothing is written if any insert fails.
pub async fn record_run(
    pool: &SqlitePool,
    campaign: RunCampaign<'_>,
    sim: &Simulation,
    noise_frac: f32,
    feedback: &NewFeedback<'_>,
) -> Result<RunIds> {
    let mut tx = pool.begin().await.context("starting run transaction")?;
    let campaign_id = match campaign {
        RunCampaign::New(c) => insert_campaign(&mut *tx, c).await?,
        RunCampaign::Existing(id) => id,
    };
    let simulation_id = insert_simulation(&mut *tx, campaign_id, sim, noise_frac).await?;
    let feedback_id = insert_feedback(&mut *tx, simulation_id, feedback).await?;
    tx.commit().await.context("committing run")?;
    Ok(RunIds {
        campaign_id,
        simulation_id,
        feedback_id,
    })
}

fn parse_grade(s: &str) -> Result<Grade> {
    match s {
        "A" => Ok(Grade::A),
        "B" => Ok(Grade::B),
        "C" => Ok(Grade::C),
        "D" => Ok(Grade::D),
        "F" => Ok(Grade::F),
        other => Err(anyhow!("unknown grade {other:?}")),
    }
}

pub async fn feedback_for_simulation(
    pool: &SqlitePool,
    simulation_id: i64,
) -> Result<Vec<FeedbackRow>> {
    let rows = sqlx::query("SELECT * FROM feedback WHERE simulation_id = ? ORDER BY id")
        .bind(simulation_id)
        .fetch_all(pool)
        .await
        .context("loading feedback")?;
    rows.iter()
        .map(|r| -> Result<FeedbackRow> {
            let grade: String = r.try_get("grade")?;
            Ok(FeedbackRow {
                id: r.try_get("id")?,
                simulation_id: r.try_get("simulation_id")?,
                provider: r.try_get("provider")?,
                grade: parse_grade(&grade)?,
                insights: json(r, "insights_json")?,
                body: r.try_get("body")?,
                created_at: r.try_get("created_at")?,
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredAbTest {
    pub id: i64,
    pub test: AbTest,
    pub result: AbTestResult,
    pub created_at: String,
}

pub async fn record_ab_test(pool: &SqlitePool, t: &AbTest, r: &AbTestResult) -> Result<i64> {
    let id = sqlx::query(
        "INSERT INTO ab_tests (name, seed, config_json, result_json, winner)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&t.name)
    .bind(r.seed as i64)
    .bind(serde_json::to_string(t).context("encoding a/b test")?)
    .bind(serde_json::to_string(r).context("encoding a/b result")?)
    .bind(r.winner.as_deref())
    .execute(pool)
    .await
    .context("inserting a/b test")?
    .last_insert_rowid();
    debug!(id, name = %t.name, "stored a/b test");
    Ok(id)
}

pub async fn get_ab_test(pool: &SqlitePool, id: i64) -> Result<Option<StoredAbTest>> {
    let row = sqlx::query("SELECT * FROM ab_tests WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("loading a/b test")?;
    row.map(|r| -> Result<StoredAbTest> {
        Ok(StoredAbTest {
            id: r.try_get("id")?,
            test: json(&r, "config_json")?,
            result: json(&r, "result_json")?,
            created_at: r.try_get("created_at")?,
        })
    })
    .transpose()
}
