//! PARIMUTUEL — command-line settlement.
//!
//! Entry point. Loads configuration, initialises structured logging, reads
//! a pasted wager table, settles it for the declared outcome and prints the
//! report. Any fatal settlement error aborts without printing a report.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{error, info};

use parimutuel::config::AppConfig;
use parimutuel::ledger;
use parimutuel::report::SettlementReport;

/// Settle a two-sided pari-mutuel contract from a wager table.
#[derive(Parser, Debug)]
#[command(name = "parimutuel", version)]
struct Cli {
    /// Wager table: date time side weight amount from to output
    table: PathBuf,

    /// Configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml", env = "PARIMUTUEL_CONFIG")]
    config: PathBuf,

    /// Declared outcome label (defaults to contract.default_outcome)
    #[arg(short, long)]
    outcome: Option<String>,

    /// Reconciliation tolerance in whole currency units
    #[arg(short, long)]
    tolerance: Option<Decimal>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!(error = %format!("{e:#}"), "Settlement aborted");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cli = Cli::parse();

    let mut cfg = AppConfig::load_or_default(&cli.config)?;
    if let Some(tolerance) = cli.tolerance {
        cfg.reconciliation.tolerance = tolerance;
        cfg.validate().context("Invalid --tolerance")?;
    }

    let declared = cli
        .outcome
        .clone()
        .unwrap_or_else(|| cfg.contract.default_outcome.clone());

    info!(
        table = %cli.table.display(),
        declared = %declared,
        tolerance = %cfg.reconciliation.tolerance,
        currency = %cfg.currency.symbol,
        "PARIMUTUEL starting settlement"
    );

    let wagers = ledger::read_ledger(&cli.table, cfg.currency.decimals)?;
    let engine = cfg.engine();
    let settlement = engine
        .settle_label(&wagers, &declared)
        .context("Settlement failed")?;

    let report = SettlementReport::build(&settlement, engine.labels(), &cfg.currency);
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    Ok(())
}

/// Initialise the `tracing` subscriber. Logs go to stderr so the report on
/// stdout stays machine-readable.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parimutuel=info"));

    let json_logging = std::env::var("PARIMUTUEL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
