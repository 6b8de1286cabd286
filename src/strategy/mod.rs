//! Processing strategy module for replay runs
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seeding the ledger, reading operations, applying them through the
//! services, and writing the results. Different scheduling implementations
//! (sequential, partitioned by account) can be selected at runtime.

use crate::cli::StrategyType;
use crate::config::EngineConfig;
use std::io::Write;
use std::path::Path;

pub mod r#async;
pub mod replay;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use replay::{partition_by_account, Replay, ReplaySummary};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay `operations_path` against the accounts in `accounts_path`
    ///
    /// # Arguments
    ///
    /// * `accounts_path` - CSV file with the accounts to seed
    /// * `operations_path` - CSV file with the operations to apply
    /// * `output` - Receives the final account states
    /// * `ledger_output` - Receives every transaction record, if given
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` if the run completed, even with rejected operations
    /// * `Err(String)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened
    /// - The tokio runtime cannot be created
    /// - Output cannot be written
    ///
    /// Malformed rows and rejected operations are logged and counted; they
    /// never abort the run.
    fn process(
        &self,
        accounts_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<ReplaySummary, String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `engine` - Amount bounds, lock timing, and account limits for the run
/// * `batch` - Optional configuration for partitioned processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    engine: EngineConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(engine)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            engine,
            batch.unwrap_or_default(),
        )),
    }
}
