//! Runtime configuration: YAML file, defaults and environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sim_ai::GradeWeights;
use sim_core::{validate_sim_config, SimConfig};
use std::path::Path;
use tracing::debug;

pub const ENV_SEED: &str = "ADLAB_SEED";
pub const ENV_DATABASE_URL: &str = "ADLAB_DATABASE_URL";

/// Settings for the feedback stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// Findings the narrator lists before summarising the rest.
    pub max_points: usize,
    pub weights: GradeWeights,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            max_points: 5,
            weights: GradeWeights::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub seed: u64,
    pub noise_frac: f32,
    pub database_url: String,
    pub feedback: FeedbackSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let sim = SimConfig::default();
        Self {
            seed: sim.rng_seed,
            noise_frac: sim.noise_frac,
            database_url: persistence::default_sqlite_url().to_string(),
            feedback: FeedbackSettings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from a YAML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_yaml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.with_env()
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: RuntimeConfig = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(ENV_SEED) {
            self.seed = seed
                .trim()
                .parse()
                .with_context(|| format!("{ENV_SEED}={seed:?} is not an unsigned integer"))?;
            debug!(seed = self.seed, "seed overridden from environment");
        }
        if let Some(url) = lookup(ENV_DATABASE_URL).filter(|u| !u.trim().is_empty()) {
            debug!(%url, "database url overridden from environment");
            self.database_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_sim_config(&self.sim_config())?;
        self.feedback.weights.validate()?;
        Ok(())
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            rng_seed: self.seed,
            noise_frac: self.noise_frac,
        }
    }
}
