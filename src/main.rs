mod config;
mod headless;
mod scenario;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use config::{AddonConfig, DEFAULT_CONFIG_PATH};
use headless::HeadlessConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run voxelhooks add-on scripts against a headless world", long_about = None)]
struct Args {
    /// Add-on configuration (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Scenario to replay (JSON list of `{tick, action}` steps)
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Recipe table overriding the builtin netherite crafter recipes
    #[arg(long)]
    recipes: Option<PathBuf>,
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 200)]
    max_ticks: u64,
    /// Write every dispatched event and broadcast to this JSONL file
    #[arg(long)]
    event_log: Option<PathBuf>,
    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,
    /// Write the effective configuration to `--config` and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> Result<()> {
    // WARN by default, override with RUST_LOG. Logs go to stderr; stdout carries the summary.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Starting voxelhooks v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AddonConfig::load_from_path(&args.config);
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.init_config {
        config.save_to_path(&args.config)?;
        info!("Wrote {}", args.config.display());
        return Ok(());
    }

    let summary = headless::run(HeadlessConfig {
        config,
        scenario: args.scenario,
        recipes: args.recipes,
        max_ticks: args.max_ticks,
        event_log: args.event_log,
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
