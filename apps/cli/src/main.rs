#![deny(warnings)]

//! `adlab`: run ad campaign simulations, A/B tests, SEO edits, chart
//! challenges and quizzes from the command line.

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sim_labs::{ChartKind, DataShape, Submission, Topic};
use sim_runtime::RuntimeConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ADLAB_GIT_SHA"),
    " ",
    env!("ADLAB_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "adlab", version = VERSION, about = "Digital marketing practice simulator")]
struct Cli {
    /// YAML runtime configuration
    #[arg(short, long, global = true, env = "ADLAB_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL; overrides the configuration file
    #[arg(long, global = true)]
    db: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a campaign scenario and print feedback
    Simulate {
        file: PathBuf,
        #[arg(short, long)]
        seed: Option<u64>,
        /// Store the campaign, run and feedback in the database
        #[arg(long)]
        save: bool,
    },
    /// Run a stored campaign again
    Resimulate {
        #[arg(long)]
        campaign_id: i64,
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Run an A/B test scenario
    Abtest {
        file: PathBuf,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long)]
        save: bool,
    },
    /// Samples per variant needed to detect a relative lift
    SampleSize {
        #[arg(long)]
        baseline: f64,
        #[arg(long)]
        mde: f64,
        #[arg(long, default_value_t = 0.95)]
        confidence: f64,
        #[arg(long, default_value_t = 0.8)]
        power: f64,
    },
    /// Compare a page before and after an SEO edit
    Seo {
        file: PathBuf,
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Show a chart challenge, or grade an answer to it
    Dataviz {
        shape: DataShape,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long)]
        chart: Option<ChartKind>,
        #[arg(long, requires = "chart")]
        answer: Option<String>,
    },
    /// Take a multiple-choice quiz; pass --answers to have it marked
    Quiz {
        #[arg(long)]
        topic: Option<Topic>,
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(short, long)]
        seed: Option<u64>,
        /// Comma-separated replies in question order, e.g. b,a,c
        #[arg(long, value_delimiter = ',')]
        answers: Vec<String>,
    },
    /// Runs and feedback stored for a campaign
    History {
        #[arg(long)]
        campaign_id: i64,
    },
    /// Stored campaigns
    Campaigns,
}

fn load_config(cli: &Cli, seed: Option<u64>) -> Result<RuntimeConfig> {
    let mut cfg = match &cli.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::from_env()?,
    };
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    if let Some(db) = &cli.db {
        cfg.database_url = db.clone();
    }
    Ok(cfg)
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value).context("encoding output")?);
    } else {
        text(value);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(version = VERSION, "starting adlab");

    match &cli.command {
        Command::Simulate { file, seed, save } => {
            let cfg = load_config(&cli, *seed)?;
            let campaign = sim_runtime::load_campaign(file)?;
            let provider = sim_runtime::default_provider(&cfg);
            if *save {
                let pool = persistence::init_db(&cfg.database_url).await?;
                let run = sim_runtime::run_and_persist(&pool, &campaign, &cfg, &provider).await?;
                emit(cli.json, &run, |r| {
                    render::report(&r.report);
                    println!(
                        "\nSaved campaign #{} run #{}",
                        r.campaign_id, r.simulation_id
                    );
                })?;
            } else {
                let report = sim_runtime::run_campaign(&campaign, &cfg, &provider)?;
                emit(cli.json, &report, render::report)?;
            }
        }
        Command::Resimulate { campaign_id, seed } => {
            let cfg = load_config(&cli, *seed)?;
            let pool = persistence::init_db(&cfg.database_url).await?;
            let provider = sim_runtime::default_provider(&cfg);
            let run = sim_runtime::resimulate(&pool, *campaign_id, &cfg, &provider).await?;
            emit(cli.json, &run, |r| render::report(&r.report))?;
        }
        Command::Abtest { file, seed, save } => {
            let cfg = load_config(&cli, *seed)?;
            let test = sim_runtime::load_ab_test(file)?;
            if *save {
                let pool = persistence::init_db(&cfg.database_url).await?;
                let stored = sim_runtime::run_ab_test_and_persist(&pool, &test, &cfg).await?;
                emit(cli.json, &stored, |s| {
                    render::ab_result(&s.result);
                    println!("\nSaved a/b test #{}", s.id);
                })?;
            } else {
                let result = sim_labs::run_ab_test(&test, cfg.seed)?;
                emit(cli.json, &result, render::ab_result)?;
            }
        }
        Command::SampleSize {
            baseline,
            mde,
            confidence,
            power,
        } => {
            let n = sim_labs::required_sample_size(*baseline, *mde, *confidence, *power)?;
            emit(cli.json, &n, |n| println!("{n} samples per variant"))?;
        }
        Command::Seo { file, seed } => {
            let cfg = load_config(&cli, *seed)?;
            let edit = sim_runtime::load_seo_edit(file)?;
            let outcome = sim_labs::simulate_edit(&edit, cfg.seed)?;
            emit(cli.json, &outcome, render::seo_outcome)?;
        }
        Command::Dataviz {
            shape,
            seed,
            chart,
            answer,
        } => {
            let cfg = load_config(&cli, *seed)?;
            let challenge = sim_labs::generate_challenge(*shape, cfg.seed)?;
            match chart {
                Some(chart) => {
                    let submission = Submission {
                        chart: *chart,
                        answer: answer.clone().unwrap_or_default(),
                    };
                    let result = sim_labs::grade_submission(&challenge, &submission);
                    emit(cli.json, &result, render::challenge_result)?;
                }
                None => emit(cli.json, &challenge, render::challenge)?,
            }
        }
        Command::Quiz {
            topic,
            count,
            seed,
            answers,
        } => {
            let cfg = load_config(&cli, *seed)?;
            let quiz = sim_labs::draw_quiz(*topic, *count, cfg.seed)?;
            if answers.is_empty() {
                emit(cli.json, &quiz, render::quiz)?;
            } else {
                let result = sim_labs::grade_quiz(&quiz, answers)?;
                emit(cli.json, &result, render::quiz_result)?;
            }
        }
        Command::History { campaign_id } => {
            let cfg = load_config(&cli, None)?;
            let pool = persistence::init_db(&cfg.database_url).await?;
            let runs = persistence::simulations_for_campaign(&pool, *campaign_id).await?;
            let mut history = Vec::with_capacity(runs.len());
            for run in runs {
                let feedback = persistence::feedback_for_simulation(&pool, run.id).await?;
                history.push((run, feedback));
            }
            emit(cli.json, &history, |h| render::history(h))?;
        }
        Command::Campaigns => {
            let cfg = load_config(&cli, None)?;
            let pool = persistence::init_db(&cfg.database_url).await?;
            let rows = persistence::list_campaigns(&pool).await?;
            emit(cli.json, &rows, |r| render::campaigns(r))?;
        }
    }
    Ok(())
}
