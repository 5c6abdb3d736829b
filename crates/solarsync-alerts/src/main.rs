//! SolarSync alerts CLI
//!
//! Checks the SolarSync alert feed once and exits with a status reflecting
//! the worst severity found.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use solarsync_alerts::alerting::{outcome_of, run_once};
use solarsync_alerts::config::{Environment, LoggingConfig};
use solarsync_alerts::logging;
use solarsync_alerts::report::RunReport;

/// SolarSync alerts - alert summary and notification for VolcaSolar sites
#[derive(Parser)]
#[command(name = "solarsync-alerts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Environment label for reports and notifications
    #[arg(
        long = "env",
        value_enum,
        default_value_t = Environment::Production,
        env = "SOLARSYNC_ENV"
    )]
    environment: Environment,

    /// Only check alerts of this site (e.g. VS-PDD-001 or pdd001)
    #[arg(long, env = "SOLARSYNC_SITE_ID")]
    site: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // .env values never override the real environment
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; the check still runs without it
    let _log_guard = logging::init(&LoggingConfig::from_env(), cli.verbose).unwrap_or_else(|e| {
        eprintln!("Error initializing logging: {e}");
        None
    });

    info!(environment = %cli.environment, site = ?cli.site, "SolarSync alert check");

    let result = run_once(cli.environment, cli.site.as_deref(), |key| {
        std::env::var(key).ok()
    })
    .await;

    match &result {
        Ok(report) => {
            if let Err(e) = print_report(report, cli.format) {
                error!(error = %e, "Cannot render report");
            }
        }
        Err(e) => {
            error!(error = %e, "Alert check aborted");
            eprintln!("Error: {e}");
        }
    }

    outcome_of(&result).into()
}

fn print_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
