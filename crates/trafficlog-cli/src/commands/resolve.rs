//! Resolve command: show the decision for one request

use super::load_rules;
use anyhow::{anyhow, Result};
use clap::Args;
use console::style;
use http::StatusCode;
use trafficlog_core::rules::parse_verb;
use trafficlog_core::Decision;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// JSON token list, or @path to read it from
    pub rules: String,

    /// Request method
    pub method: String,

    /// Response status; omit for the request phase
    pub status: Option<u16>,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn resolve(args: ResolveArgs) -> Result<()> {
    let rules = load_rules(Some(&args.rules)).await?;

    let method = parse_verb(&args.method)
        .ok_or_else(|| anyhow!("unknown request method `{}`", args.method))?;
    let status = args
        .status
        .map(StatusCode::from_u16)
        .transpose()
        .map_err(|_| anyhow!("invalid status code {}", args.status.unwrap_or_default()))?;

    let decision = rules.resolve(&method, status);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print!("{}", describe(&decision));
    }
    Ok(())
}

fn describe(decision: &Decision) -> String {
    if !decision.include {
        return format!("{}\n", style("excluded").red().bold());
    }

    let facets: Vec<&str> = decision.facets.iter().map(|facet| facet.as_str()).collect();
    let mut out = format!("{}\n", style("included").green().bold());
    out.push_str(&format!(
        "facets: {}\n",
        if facets.is_empty() {
            "none".to_string()
        } else {
            facets.join(", ")
        }
    ));
    if decision.awaits_status {
        out.push_str("request record held until the status is known\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use trafficlog_core::Ruleset;

    #[test]
    fn test_describe_included() {
        let rules = Ruleset::from_json_str(r#"["headers", {"post": "request_bodies"}]"#).unwrap();
        let text = describe(&rules.resolve(&Method::POST, None));
        let text = console::strip_ansi_codes(&text);
        assert_eq!(
            text,
            "included\nfacets: request_headers, response_headers, request_bodies\n"
        );
    }

    #[test]
    fn test_describe_awaiting_status() {
        let rules = Ruleset::from_json_str("[404]").unwrap();
        let text = describe(&rules.resolve(&Method::GET, None));
        assert!(text.contains("facets: none"));
        assert!(text.contains("held until the status is known"));
    }

    #[test]
    fn test_describe_excluded() {
        let rules = Ruleset::from_json_str("[404]").unwrap();
        let text = describe(&rules.resolve(&Method::GET, Some(StatusCode::OK)));
        assert_eq!(console::strip_ansi_codes(&text), "excluded\n");
    }
}
