//! Storewatch CLI
//!
//! One-shot runner: probes the configured listings once and exits with a
//! scheduler-friendly status code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use storewatch::load_config;
use tracing::Level;

#[derive(Parser)]
#[command(name = "storewatch")]
#[command(about = "Storefront listing availability monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// State file path (overrides config file)
    #[arg(long)]
    state: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, state={:?}, log_level={:?}",
        args.config,
        args.state,
        args.log_level
    );

    let mut config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(1);
        }
    };

    config.resolve_secrets();

    if let Some(state) = args.state {
        config.state_file = state;
    }

    match storewatch::run(config).await {
        Ok(run) => {
            if !run.is_clean() {
                tracing::warn!(
                    "Run not clean: {} unhealthy, {} delivery failures",
                    run.unhealthy,
                    run.delivery_failures
                );
            }
            ExitCode::from(run.exit_code())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            ExitCode::from(1)
        }
    }
}
