//! qapps-export: inventory Q Business applications and their Q Apps.
//!
//! Reads `--config` (YAML) and `--env` (dotenv credentials), writes CSV and/or
//! JSON into the configured output directory and prints a summary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use qapps_cli::{diagnostic, init_tracing, run, RunContext};
use qapps_client::create_api;
use qapps_core::{Credentials, ExportConfig};

#[derive(Parser, Debug)]
#[command(name = "qapps-export")]
#[command(about = "Export Q Business applications and Q Apps library items to CSV/JSON")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, value_name = "PATH", default_value = "./input/config.yml")]
    config: PathBuf,

    /// Path to the dotenv credentials file
    #[arg(long, value_name = "PATH", default_value = "./config/.env")]
    env: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Tracing has to be up before the config loader logs, so peek at the flag first
    let verbose = ExportConfig::figment(&args.config)
        .extract_inner::<bool>("logging.verbose")
        .unwrap_or(true);
    init_tracing(verbose);

    match export(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Export failed");
            eprintln!("{}", diagnostic(&err));
            ExitCode::FAILURE
        }
    }
}

async fn export(args: &Args) -> anyhow::Result<()> {
    let config = ExportConfig::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    let credentials = Credentials::from_env_file(&args.env)
        .with_context(|| format!("loading credentials from {}", args.env.display()))?;

    let api = create_api(&config, &credentials)
        .await
        .context("creating AWS clients")?;

    let ctx = RunContext::now(config, credentials);
    let summary = run(&api, &ctx).await.context("export run failed")?;

    println!("{}", summary);
    Ok(())
}
