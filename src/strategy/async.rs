//! Partitioned concurrent processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Operations are read in batches; within a batch
//! they are partitioned by account and the partitions run concurrently.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── EngineConfig (amount bounds, lock timing, account limits)
//!     ├── BatchConfig  (batch_size, max_concurrent_batches)
//!     ├── OperationReader (streaming CSV rows)
//!     └── Replay (shared services, cloned into each partition task)
//!         ├── TransactionService ─┐
//!         └── AccountService ─────┴── one KeyedLockManager
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so an operation never overtakes one from
//!   an earlier batch
//! - Within a batch, each account's operations keep their file order
//! - Operations on different accounts in the same batch may interleave
//!
//! Because every balance change goes through the per-account lock, the final
//! balances match the sequential strategy. Only inquiries, which have no
//! account and form their own partition, can observe a different moment.

use crate::config::EngineConfig;
use crate::io::sync_reader::OperationReader;
use crate::strategy::replay::{Replay, ReplaySummary};
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Configuration for batch processing
///
/// Controls how many operations are read per batch and the number of worker
/// threads that run the partitions of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Worker threads running partitions concurrently
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "Invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Partitioned concurrent processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    engine: EngineConfig,
    batch: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `engine` - Configuration for the services
    /// * `batch` - Batch size and worker thread count
    pub fn new(engine: EngineConfig, batch: BatchConfig) -> Self {
        Self { engine, batch }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Replay operations batch by batch, partitions of a batch in parallel
    ///
    /// 1. Creates a multi-threaded tokio runtime
    /// 2. Seeds the ledger from the accounts file
    /// 3. Reads up to `batch_size` operations
    /// 4. Partitions them by account and waits for all partitions to finish
    /// 5. Repeats from 3 until the operations file is exhausted
    /// 6. Writes the final accounts (and the ledger, if requested)
    fn process(
        &self,
        accounts_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<ReplaySummary, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent_batches)
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let replay = Replay::new(&self.engine);
        let seeded = replay.seed_from(accounts_path)?;
        let mut reader = OperationReader::operations(operations_path)?;

        let mut summary = ReplaySummary::default();
        runtime.block_on(async {
            loop {
                let mut batch = Vec::with_capacity(self.batch.batch_size);
                let mut rows = 0;
                for row in reader.by_ref().take(self.batch.batch_size) {
                    rows += 1;
                    match row {
                        Ok(operation) => batch.push(operation),
                        Err(e) => {
                            warn!(error = %e, "Skipping operation row");
                            summary.malformed += 1;
                        }
                    }
                }

                if rows == 0 {
                    break;
                }

                // Wait for the whole batch before reading the next one
                let partial = replay.apply_partitioned(batch).await;
                summary.merge(partial);
            }
        });
        summary.malformed += seeded.malformed;

        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Replay finished"
        );

        replay.write_results(output, ledger_output)?;
        Ok(summary)
    }
}
