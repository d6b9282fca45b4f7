//! Feed acquisition and config loading helpers.

use anyhow::Context;
use chrono::Utc;
use sagres::RawFeeds;
use sagres::eval::EvalConfig;
use sagres::feed::{DEFAULT_STEP, FeedClient, demo_feeds};
use std::path::Path;

/// Demo resolution in minutes, matching the live backend's default step.
const DEMO_STEP_MINUTES: i64 = 5;

/// Fetch the raw feeds from the live backend, or synthesize them in demo
/// mode.
pub(crate) async fn load_feeds(demo: bool, asset: &str, hours: i64) -> anyhow::Result<RawFeeds> {
    if demo {
        tracing::info!(asset, hours, "generating demo feeds");
        return Ok(demo_feeds(asset, hours, DEMO_STEP_MINUTES, Utc::now())?);
    }

    let client = FeedClient::from_env().context("configuring metrics backend client")?;
    client
        .fetch_all(asset, hours, DEFAULT_STEP)
        .await
        .with_context(|| format!("fetching feeds for {asset}"))
}

/// Load the evaluation config from a JSON file, or fall back to defaults
/// when no path is given.
///
/// An explicitly named file must exist and parse; invalid values are
/// rejected up front rather than silently replaced.
pub(crate) fn load_eval_config(path: Option<&str>) -> anyhow::Result<EvalConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("reading config file {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))?
        }
        None => EvalConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
