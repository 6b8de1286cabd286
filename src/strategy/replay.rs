//! Replay of scripted operations against in-memory services
//!
//! A `Replay` wires the in-memory ledger and log to a `TransactionService`
//! and an `AccountService` sharing one lock table, then applies `Operation`s
//! to them. Both processing strategies drive the same `Replay`; they differ
//! only in how operations are scheduled.
//!
//! # Labels
//!
//! Transaction IDs are generated, so an operations file cannot know them in
//! advance. A `use` row may carry a label in its `ref` column; the ID of the
//! resulting record is stored under that label, and later `cancel` or
//! `inquiry` rows resolve their `ref` through the same table. A `ref` that is
//! not a known label is taken verbatim as a transaction ID.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::core::traits::BalanceLedger;
use crate::core::{
    AccountService, AuditRecorder, InMemoryLedger, InMemoryTransactionLog, KeyedLockManager,
    TransactionEngine, TransactionService,
};
use crate::io::csv_format::{write_accounts_csv, write_ledger_csv};
use crate::io::sync_reader::AccountReader;
use crate::types::{
    AccountError, AccountSeed, CancelTransaction, CloseAccount, Operation, TransactionId,
    UseTransaction,
};

/// Outcome counts of a replay run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations that completed
    pub applied: usize,

    /// Operations the services rejected
    pub rejected: usize,

    /// Rows that could not be parsed and were skipped
    pub malformed: usize,
}

impl ReplaySummary {
    pub fn record(&mut self, result: &Result<(), AccountError>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }

    pub fn merge(&mut self, other: ReplaySummary) {
        self.applied += other.applied;
        self.rejected += other.rejected;
        self.malformed += other.malformed;
    }
}

/// Services and storage for one replay run
///
/// Cloning is cheap and clones share all state, so partitions of the
/// operations can be replayed from concurrent tasks.
#[derive(Debug, Clone)]
pub struct Replay {
    ledger: Arc<InMemoryLedger>,
    log: Arc<InMemoryTransactionLog>,
    transactions: TransactionService,
    accounts: AccountService,
    labels: Arc<DashMap<String, TransactionId>>,
}

impl Replay {
    /// Build fresh storage and services from `config`
    pub fn new(config: &EngineConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let log = Arc::new(InMemoryTransactionLog::new());
        let locks = KeyedLockManager::new(config.lock.clone());
        let id_attempts = config.account.id_generation_attempts;

        let engine = TransactionEngine::new(
            ledger.clone(),
            log.clone(),
            config.transaction.clone(),
            id_attempts,
        );
        let audit = AuditRecorder::new(ledger.clone(), log.clone(), id_attempts);

        Self {
            transactions: TransactionService::new(engine, audit, locks.clone()),
            accounts: AccountService::new(ledger.clone(), locks, config.account.clone()),
            ledger,
            log,
            labels: Arc::new(DashMap::new()),
        }
    }

    pub fn transactions(&self) -> &TransactionService {
        &self.transactions
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn log(&self) -> &InMemoryTransactionLog {
        &self.log
    }

    /// Create one seeded account
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The account (and its user, if new) now exists
    /// * `Err(String)` - The account number is already taken
    pub fn seed(&self, seed: AccountSeed) -> Result<(), String> {
        let taken = self
            .ledger
            .find_account_by_number(&seed.account_number)
            .map_err(|e| e.to_string())?
            .is_some();
        if taken {
            return Err(format!("Duplicate account number {}", seed.account_number));
        }

        self.ledger
            .seed_account(seed.user, &seed.account_number, seed.balance, seed.status);
        Ok(())
    }

    /// Seed every valid row of an accounts file
    ///
    /// Invalid rows are logged and counted as malformed.
    ///
    /// # Returns
    ///
    /// * `Ok(ReplaySummary)` - `applied` holds the number of seeded accounts
    /// * `Err(String)` - The file could not be opened
    pub fn seed_from(&self, path: &Path) -> Result<ReplaySummary, String> {
        let mut summary = ReplaySummary::default();

        for row in AccountReader::accounts(path)? {
            match row.and_then(|seed| self.seed(seed)) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    warn!(error = %e, "Skipping account row");
                    summary.malformed += 1;
                }
            }
        }

        info!(accounts = summary.applied, "Ledger seeded");
        Ok(summary)
    }

    /// Apply one operation through the services
    ///
    /// Rejections are logged here; failed uses and cancels have also been
    /// audited by the transaction service.
    pub async fn apply(&self, operation: Operation) -> Result<(), AccountError> {
        let name = operation.name();
        let result = self.dispatch(operation).await;

        if let Err(e) = &result {
            warn!(op = name, code = %e.code(), error = %e, "Operation rejected");
        }
        result
    }

    /// Apply operations one after another, in order
    pub async fn apply_all(&self, operations: Vec<Operation>) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        for operation in operations {
            let result = self.apply(operation).await;
            summary.record(&result);
        }
        summary
    }

    /// Apply operations grouped by account
    ///
    /// Each account's operations run in their original order on one task;
    /// different accounts run concurrently. Must be called from within a
    /// tokio runtime.
    pub async fn apply_partitioned(&self, operations: Vec<Operation>) -> ReplaySummary {
        let mut tasks = Vec::new();
        for (_account, partition) in partition_by_account(operations) {
            let replay = self.clone();
            tasks.push(tokio::spawn(async move { replay.apply_all(partition).await }));
        }

        let mut summary = ReplaySummary::default();
        for task in futures::future::join_all(tasks).await {
            match task {
                Ok(partial) => summary.merge(partial),
                Err(e) => error!(error = %e, "Replay task panicked"),
            }
        }
        summary
    }

    async fn dispatch(&self, operation: Operation) -> Result<(), AccountError> {
        match operation {
            Operation::Use {
                user,
                account_number,
                label,
                amount,
            } => {
                let record = self
                    .transactions
                    .use_transaction(&UseTransaction::new(user, account_number, amount))
                    .await?;
                if let Some(label) = label {
                    self.labels.insert(label, record.transaction_id.clone());
                }
                debug!(transaction_id = %record.transaction_id, "Use applied");
                Ok(())
            }
            Operation::Cancel {
                reference,
                account_number,
                amount,
            } => {
                let request =
                    CancelTransaction::new(self.resolve(&reference), account_number, amount);
                let record = self.transactions.cancel_transaction(&request).await?;
                debug!(transaction_id = %record.transaction_id, "Cancel applied");
                Ok(())
            }
            Operation::Close {
                user,
                account_number,
            } => {
                self.accounts
                    .close_account(&CloseAccount::new(user, account_number))
                    .await?;
                Ok(())
            }
            Operation::Inquiry { reference } => {
                let record = self
                    .transactions
                    .inquiry_transaction(&self.resolve(&reference))?;
                info!(
                    reference = %reference,
                    transaction_id = %record.transaction_id,
                    account = %record.account_number,
                    kind = record.transaction_type.as_str(),
                    result = record.result.as_str(),
                    amount = record.amount,
                    "Inquiry"
                );
                Ok(())
            }
        }
    }

    fn resolve(&self, reference: &str) -> TransactionId {
        self.labels
            .get(reference)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| TransactionId::from(reference))
    }

    /// Write final accounts and, if requested, the full ledger
    pub fn write_results(
        &self,
        output: &mut dyn Write,
        ledger_output: Option<&mut dyn Write>,
    ) -> Result<(), String> {
        let accounts = self.ledger.all_accounts().map_err(|e| e.to_string())?;
        write_accounts_csv(&accounts, output)?;

        if let Some(ledger_output) = ledger_output {
            write_ledger_csv(&self.log.all_records(), ledger_output)?;
        }
        Ok(())
    }
}

/// Partition operations by the account they lock
///
/// Operations without an account (inquiries) share one partition under the
/// empty key. Each partition keeps the original relative order.
pub fn partition_by_account(operations: Vec<Operation>) -> HashMap<String, Vec<Operation>> {
    let mut partitions: HashMap<String, Vec<Operation>> = HashMap::new();

    for operation in operations {
        let key = operation.account_number().unwrap_or_default().to_string();
        partitions.entry(key).or_default().push(operation);
    }

    partitions
}
