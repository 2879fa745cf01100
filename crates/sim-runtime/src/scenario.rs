//! Scenario files: campaigns, A/B tests and SEO edits written in YAML.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use sim_core::{validate_ab_test, validate_campaign, AbTest, Campaign};
use sim_labs::SeoEdit;
use std::path::Path;
use tracing::debug;

fn load_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {what} {}", path.display()))?;
    let value = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing {what} {}", path.display()))?;
    debug!(path = %path.display(), what, "loaded scenario");
    Ok(value)
}

/// Load and validate a campaign.
pub fn load_campaign(path: impl AsRef<Path>) -> Result<Campaign> {
    let path = path.as_ref();
    let c: Campaign = load_yaml(path, "campaign")?;
    validate_campaign(&c).with_context(|| format!("invalid campaign {}", path.display()))?;
    Ok(c)
}

/// Load and validate an A/B test.
pub fn load_ab_test(path: impl AsRef<Path>) -> Result<AbTest> {
    let path = path.as_ref();
    let t: AbTest = load_yaml(path, "a/b test")?;
    validate_ab_test(&t).with_context(|| format!("invalid a/b test {}", path.display()))?;
    Ok(t)
}

pub fn load_seo_edit(path: impl AsRef<Path>) -> Result<SeoEdit> {
    load_yaml(path.as_ref(), "seo edit")
}
