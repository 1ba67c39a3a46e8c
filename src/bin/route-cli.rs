use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use signage_edge::config::{load_config, load_default, EdgeConfig};
use signage_edge::routing::{search_token, Normalizer, RequestAttrs, RouteScope, RuleSettings};
use signage_edge::LocaleSet;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Inspect routing decisions of the signage edge", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the routing decision for an absolute URL
    Explain { url: String },
    /// List rules in evaluation order and the configured locales
    Rules,
    /// Decode the search token at the end of a path
    Decode { path: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_default()?,
    };
    let normalizer = build_normalizer(&config)?;

    let output = match cli.command {
        Commands::Explain { url } => {
            let attrs = RequestAttrs::parse_url(&url)?;
            let scope = RouteScope::from_config(&config.routing);
            if scope.includes(&attrs.path) {
                let decision = normalizer.decide(&attrs);
                json!({
                    "url": url,
                    "in_scope": true,
                    "rule": decision.rule,
                    "action": decision.action,
                })
            } else {
                json!({
                    "url": url,
                    "in_scope": false,
                    "action": { "type": "pass_through" },
                })
            }
        }
        Commands::Rules => json!({
            "rules": normalizer.rule_names(),
            "locales": normalizer.locales().locales(),
            "default_locale": normalizer.locales().default_locale(),
            "excluded_prefixes": config.routing.excluded_prefixes,
        }),
        Commands::Decode { path } => {
            let (base, query) = search_token::split(&path);
            let params: Vec<_> = query
                .iter()
                .flat_map(|q| q.iter())
                .map(|(k, v)| json!([k, v]))
                .collect();
            json!({
                "path": base,
                "query": params,
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_normalizer(config: &EdgeConfig) -> Result<Normalizer, Box<dyn std::error::Error>> {
    let locales = LocaleSet::new(config.locales.codes.clone(), config.locales.default.clone())?;
    Ok(Normalizer::new(
        Arc::new(locales),
        RuleSettings::from_config(&config.routing),
    ))
}
