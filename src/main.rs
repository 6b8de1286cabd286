//! Account ledger replay CLI
//!
//! Seeds a ledger from an accounts CSV, replays an operations CSV against it,
//! and prints the final accounts.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv operations.csv > final.csv
//! cargo run -- --strategy sync accounts.csv operations.csv > final.csv
//! cargo run -- --min-amount 100 --max-amount 1000 --ledger-out ledger.csv accounts.csv operations.csv
//! RUST_LOG=account_ledger=debug cargo run -- accounts.csv operations.csv
//! ```
//!
//! Final accounts go to stdout; logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations do not change the exit code)
//! - 1: Error (missing arguments, unreadable input, unwritable output, etc.)

use account_ledger::cli;
use account_ledger::strategy;
use std::fs::File;
use std::io::Write;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), String> {
    let batch = matches!(args.strategy, cli::StrategyType::Async).then(|| args.to_batch_config());
    let strategy = strategy::create_strategy(args.strategy.clone(), args.to_engine_config(), batch);

    let mut ledger_file = match &args.ledger_out {
        Some(path) => Some(
            File::create(path)
                .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?,
        ),
        None => None,
    };

    let mut output = std::io::stdout();
    strategy.process(
        &args.accounts_file,
        &args.operations_file,
        &mut output,
        ledger_file.as_mut().map(|file| file as &mut dyn Write),
    )?;
    Ok(())
}
