//! Alloy Designer command-line entry point.
//!
//! ```text
//! alloy-designer predict --target YS --composition Al=97.9,Mg=1.0,Si=0.6,Cu=0.28,Cr=0.2
//! alloy-designer suggest --target YS --value 300 --tolerance 0.1 --count 5
//! alloy-designer serve-stdio < requests.jsonl
//! ```
//!
//! Logs go to stderr; stdout carries only results.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use alloy_designer::config::AppConfig;
use alloy_designer::protocol;
use alloy_designer::service::{AlloyService, PredictRequest, SuggestRequest};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "alloy-designer")]
#[command(about = "Aluminum alloy property prediction and inverse composition search")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (falls back to ./alloy_config.toml, then defaults)
    #[arg(long, global = true, env = "ALLOY_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Predict a property for one composition
    Predict {
        /// Target property (YS or UTS)
        #[arg(long, default_value = "YS")]
        target: String,
        /// Element amounts in wt%, e.g. Al=97.9,Mg=1.0,Si=0.6
        #[arg(long, value_name = "EL=WT%,...")]
        composition: String,
        /// Processing parameters, e.g. homog_temp_max_C=540,cold_rolling_reduction_pct=40
        #[arg(long, value_name = "KEY=VALUE,...")]
        processing: Option<String>,
        /// Predictor mode (default from config)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Search for compositions near a target value
    Suggest {
        /// Target property (YS or UTS)
        #[arg(long, default_value = "YS")]
        target: String,
        /// Target value (MPa)
        #[arg(long)]
        value: f64,
        /// Allowed fractional deviation
        #[arg(long, default_value_t = 0.1)]
        tolerance: f64,
        /// Number of candidates to return
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Predictor mode (default from config)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Serve JSON-lines requests on stdin/stdout until EOF or Ctrl+C
    ServeStdio,

    /// Print service health
    Health,

    /// Print service description and model inventory
    Info,
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse `k=v,k=v` into a JSON object so the request types apply their own
/// key validation.
fn parse_pairs(raw: &str) -> Result<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got '{pair}'"))?;
        let number: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a number", value.trim()))?;
        map.insert(key.trim().to_string(), serde_json::json!(number));
    }
    Ok(serde_json::Value::Object(map))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load(),
    };
    let service = AlloyService::new(config);

    match args.command {
        SubCommand::Predict {
            target,
            composition,
            processing,
            mode,
        } => {
            let composition = serde_json::from_value(parse_pairs(&composition)?)
                .context("invalid --composition")?;
            let processing = match processing {
                Some(raw) => serde_json::from_value(parse_pairs(&raw)?).context("invalid --processing")?,
                None => Default::default(),
            };
            let resp = service
                .predict(PredictRequest {
                    target,
                    composition,
                    processing,
                    mode,
                })
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", e.code(), e))?;
            print_json(&resp)?;
        }

        SubCommand::Suggest {
            target,
            value,
            tolerance,
            count,
            mode,
        } => {
            let resp = service
                .suggest(SuggestRequest {
                    target,
                    value,
                    tolerance,
                    count,
                    mode,
                })
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", e.code(), e))?;
            print_json(&resp)?;
        }

        SubCommand::ServeStdio => {
            // Graceful shutdown via Ctrl+C
            let cancel_token = CancellationToken::new();
            let shutdown_token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Received Ctrl+C, shutting down");
                shutdown_token.cancel();
            });

            info!(service = %service.config().service.name, "Serving JSON-lines requests on stdin");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            protocol::serve(&service, stdin, tokio::io::stdout(), cancel_token)
                .await
                .context("protocol loop failed")?;
        }

        SubCommand::Health => print_json(&service.health())?,

        SubCommand::Info => print_json(&service.info())?,
    }

    Ok(())
}
