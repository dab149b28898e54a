//! Summary Synth - LLM-powered answers over organization-scoped data
//!
//! A CLI tool that decomposes a high-level analytic question into
//! subqueries, runs each one against an organization-scoped data service,
//! and synthesizes the partial results into one narrative answer.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, connection, synthesis failure, etc.)

mod cli;
mod config;
mod datasource;
mod error;
mod models;
mod oracle;
mod pipeline;
mod report;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use datasource::HttpDataTool;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{Collaborators, Pipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("summary-synth v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .summary-synth.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging on stderr; stdout carries only the answer.
fn init_logging(args: &Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let (decomposition_oracle, synthesis_oracle) = oracle::build_oracles(&config.oracle)?;
    let data_tool = Arc::new(HttpDataTool::new(&config.data_source)?);

    let pipeline = Pipeline::new(
        Collaborators {
            decomposition_oracle,
            synthesis_oracle,
            data_tool,
        },
        &config,
    );

    let query = args.query_text();
    let format = config.general.format;

    let spinner = spinner(args.quiet)?;

    let output = if args.plan_only {
        spinner.set_message("Decomposing query...");
        let plan = pipeline.plan(query).await;
        spinner.finish_and_clear();
        report::render_plan(&plan, format)?
    } else {
        spinner.set_message(format!("Answering for org {}...", args.organization_id()));
        let trace = pipeline.run_traced(query, args.organization_id()).await;
        spinner.finish_and_clear();

        let trace = trace?;
        if trace.failed_count() > 0 {
            warn!(
                "{} of {} subqueries failed; the answer may be incomplete",
                trace.failed_count(),
                trace.subqueries.len()
            );
        }
        report::render(&trace, format, &config.oracle.model)?
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write answer to {}", path.display()))?;
            info!("Answer saved to {}", path.display());
        }
        None => print!("{}", output),
    }

    Ok(())
}

fn spinner(hidden: bool) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .context("Invalid progress template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
