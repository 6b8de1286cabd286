//! Shared fixtures for core unit tests

use std::sync::Arc;

use crate::core::traits::TransactionLog;
use crate::core::{InMemoryLedger, InMemoryTransactionLog};
use crate::types::{AccountError, AccountStatus, TransactionId, TransactionRecord, UserId};

pub const OWNER: UserId = 1;
pub const STRANGER: UserId = 2;
pub const USED_ACCOUNT: &str = "1000000000";
pub const OTHER_ACCOUNT: &str = "2000000000";

/// A ledger where OWNER holds USED_ACCOUNT with `balance` and STRANGER holds
/// OTHER_ACCOUNT with 5000, plus an empty log
pub fn seeded(balance: i64) -> (Arc<InMemoryLedger>, Arc<InMemoryTransactionLog>) {
    let ledger = InMemoryLedger::new();
    ledger.seed_account(OWNER, USED_ACCOUNT, balance, AccountStatus::Open);
    ledger.seed_account(STRANGER, OTHER_ACCOUNT, 5000, AccountStatus::Open);
    (Arc::new(ledger), Arc::new(InMemoryTransactionLog::new()))
}

/// A log whose appends always fail
#[derive(Debug, Default)]
pub struct FailingLog;

impl TransactionLog for FailingLog {
    fn save_transaction(
        &self,
        _record: TransactionRecord,
    ) -> Result<TransactionRecord, AccountError> {
        Err(AccountError::internal("transaction log unavailable"))
    }

    fn find_transaction_by_id(
        &self,
        _transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError> {
        Ok(None)
    }

    fn find_by_account(
        &self,
        _account_number: &str,
    ) -> Result<Vec<TransactionRecord>, AccountError> {
        Ok(Vec::new())
    }

    fn find_cancellation_of(
        &self,
        _transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError> {
        Ok(None)
    }
}
