//! Check command: validate a rule list

use super::load_rules;
use anyhow::Result;
use clap::Args;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✅ ", "+ ");

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON token list, or @path to read it from (default: TRAFFIC_LOG_RULES)
    pub rules: Option<String>,
}

pub async fn check(args: CheckArgs) -> Result<()> {
    let rules = load_rules(args.rules.as_deref()).await?;

    println!("{}{}", CHECK, style("Rules are valid").green().bold());
    println!();
    print!("{}", rules);

    Ok(())
}
