//! Sequential processing strategy
//!
//! Applies operations strictly in file order on a single-threaded tokio
//! runtime. Every operation finishes (including its audit) before the next
//! one is read.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `OperationReader` (iterator interface)
//! - Business rules and locking to the services inside `Replay`
//! - CSV output to `Replay::write_results`
//!
//! Operations are streamed one at a time, so memory usage is bounded by the
//! ledger and log, not by the operations file.

use crate::config::EngineConfig;
use crate::io::sync_reader::OperationReader;
use crate::strategy::replay::{Replay, ReplaySummary};
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Sequential processing strategy
///
/// # Examples
///
/// ```no_run
/// use account_ledger::config::EngineConfig;
/// use account_ledger::strategy::{ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(EngineConfig::default());
/// let mut output = io::stdout();
///
/// strategy
///     .process(
///         Path::new("accounts.csv"),
///         Path::new("operations.csv"),
///         &mut output,
///         None,
///     )
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: EngineConfig,
}

impl SyncProcessingStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        accounts_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<ReplaySummary, String> {
        // Lock waits use tokio timers, so even the sequential run needs a runtime.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let replay = Replay::new(&self.config);
        let seeded = replay.seed_from(accounts_path)?;
        let reader = OperationReader::operations(operations_path)?;

        let mut summary = ReplaySummary::default();
        runtime.block_on(async {
            for row in reader {
                match row {
                    Ok(operation) => {
                        let result = replay.apply(operation).await;
                        summary.record(&result);
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping operation row");
                        summary.malformed += 1;
                    }
                }
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
