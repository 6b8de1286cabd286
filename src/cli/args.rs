use crate::config::{AccountConfig, EngineConfig, LockConfig, TransactionConfig};
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay account operations against a seeded ledger
#[derive(Parser, Debug)]
#[command(name = "account-ledger")]
#[command(
    about = "Replay account operations against a seeded ledger",
    long_about = None
)]
pub struct CliArgs {
    /// Seeded accounts CSV file path
    #[arg(
        value_name = "ACCOUNTS",
        help = "Path to the accounts CSV (user,account,balance,status)"
    )]
    pub accounts_file: PathBuf,

    /// Operations CSV file path
    #[arg(
        value_name = "OPERATIONS",
        help = "Path to the operations CSV (op,user,account,ref,amount)"
    )]
    pub operations_file: PathBuf,

    /// Scheduling strategy for the operations
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for file order or 'async' for per-account partitions"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "min-amount",
        value_name = "AMOUNT",
        help = "Smallest accepted use amount in minor units (default: 10)"
    )]
    pub min_amount: Option<i64>,

    #[arg(
        long = "max-amount",
        value_name = "AMOUNT",
        help = "Largest accepted use amount in minor units (default: 1000000)"
    )]
    pub max_amount: Option<i64>,

    #[arg(
        long = "lock-wait-ms",
        value_name = "MS",
        help = "How long an operation waits for its account lock (default: 1000)"
    )]
    pub lock_wait_ms: Option<u64>,

    #[arg(
        long = "lock-lease-ms",
        value_name = "MS",
        help = "Hold time after which a lock holder is reported (default: 15000)"
    )]
    pub lock_lease_ms: Option<u64>,

    #[arg(
        long = "account-limit",
        value_name = "COUNT",
        help = "Open accounts allowed per user (default: 10)"
    )]
    pub account_limit: Option<usize>,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads running account partitions (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Where to write every transaction record
    #[arg(long = "ledger-out", value_name = "PATH")]
    pub ledger_out: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        default_value = "warn",
        help = "Log filter for stderr, e.g. 'info' or 'account_ledger=debug'"
    )]
    pub log_level: String,
}

/// Available processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create an EngineConfig from CLI arguments
    ///
    /// Unset options take their defaults. Invalid combinations (e.g. a
    /// minimum above the maximum) fall back to defaults with a warning.
    pub fn to_engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();

        let transaction = TransactionConfig::new(
            self.min_amount.unwrap_or(defaults.transaction.min_amount),
            self.max_amount.unwrap_or(defaults.transaction.max_amount),
        );
        let lock = LockConfig::new(
            self.lock_wait_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock.wait),
            self.lock_lease_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lock.lease),
        );
        let account = AccountConfig::new(
            self.account_limit
                .unwrap_or(defaults.account.account_limit_per_user),
            defaults.account.id_generation_attempts,
        );

        EngineConfig {
            transaction,
            lock,
            account,
        }
    }

    /// Create a BatchConfig from CLI arguments
    ///
    /// # Returns
    ///
    /// A `BatchConfig` with values from CLI arguments or defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "a.csv", "o.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "a.csv", "o.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "a.csv", "o.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        match (&parsed.strategy, &expected) {
            (StrategyType::Sync, StrategyType::Sync) => (),
            (StrategyType::Async, StrategyType::Async) => (),
            _ => panic!("Expected {:?}, got {:?}", expected, parsed.strategy),
        }
    }

    #[test]
    fn test_positional_paths_and_ledger_out() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--ledger-out",
            "ledger.csv",
            "accounts.csv",
            "operations.csv",
        ])
        .unwrap();

        assert_eq!(parsed.accounts_file, PathBuf::from("accounts.csv"));
        assert_eq!(parsed.operations_file, PathBuf::from("operations.csv"));
        assert_eq!(parsed.ledger_out, Some(PathBuf::from("ledger.csv")));
        assert_eq!(parsed.log_level, "warn");
    }

    #[test]
    fn test_engine_config_defaults() {
        let parsed = CliArgs::try_parse_from(["program", "a.csv", "o.csv"]).unwrap();
        assert_eq!(parsed.to_engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_engine_config_from_flags() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--min-amount",
            "100",
            "--max-amount",
            "1000",
            "--lock-wait-ms",
            "250",
            "--lock-lease-ms",
            "5000",
            "--account-limit",
            "3",
            "a.csv",
            "o.csv",
        ])
        .unwrap();

        let config = parsed.to_engine_config();
        assert_eq!(config.transaction.min_amount, 100);
        assert_eq!(config.transaction.max_amount, 1000);
        assert_eq!(config.lock.wait, Duration::from_millis(250));
        assert_eq!(config.lock.lease, Duration::from_millis(5000));
        assert_eq!(config.account.account_limit_per_user, 3);
    }

    #[test]
    fn test_engine_config_inverted_bounds_fall_back() {
        let parsed =
            CliArgs::try_parse_from(["program", "--min-amount", "5000", "a.csv", "o.csv"]).unwrap();
        let config = parsed.to_engine_config();

        // A raised minimum alone is valid
        assert_eq!(config.transaction.min_amount, 5000);

        let parsed = CliArgs::try_parse_from([
            "program",
            "--min-amount",
            "5000",
            "--max-amount",
            "100",
            "a.csv",
            "o.csv",
        ])
        .unwrap();
        assert_eq!(
            parsed.to_engine_config().transaction,
            TransactionConfig::default()
        );
    }

    #[rstest]
    #[case::all_defaults(&["program", "a.csv", "o.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "a.csv", "o.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "a.csv", "o.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "a.csv", "o.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        let config = parsed.to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::missing_inputs(&["program"])]
    #[case::missing_operations(&["program", "a.csv"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "a.csv", "o.csv"])]
    #[case::non_numeric_amount(&["program", "--min-amount", "ten", "a.csv", "o.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
