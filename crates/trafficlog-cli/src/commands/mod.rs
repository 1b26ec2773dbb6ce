//! CLI commands

mod check;
mod render;
mod resolve;

pub use check::{check, CheckArgs};
pub use render::{render, RenderArgs};
pub use resolve::{resolve, ResolveArgs};

use anyhow::{Context, Result};
use trafficlog::config::{load_dotenv, TrafficLogSettings};
use trafficlog_core::Ruleset;

/// Resolve a rule list given as JSON text, `@path`, or `TRAFFIC_LOG_RULES`.
pub(crate) async fn load_rules(source: Option<&str>) -> Result<Ruleset> {
    let text = match source {
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read rules from {}", path))?,
            None => arg.to_string(),
        },
        None => {
            load_dotenv();
            let settings = TrafficLogSettings::from_env()?;
            settings.rules.unwrap_or_else(|| "[]".to_string())
        }
    };
    tracing::debug!(rules = %text.trim(), "resolving rules");
    Ok(Ruleset::from_json_str(&text)?)
}
