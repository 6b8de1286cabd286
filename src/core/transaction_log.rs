//! Thread-safe in-memory transaction log
//!
//! This module provides the `InMemoryTransactionLog` struct, an append-only
//! record store built on `DashMap`.
//!
//! # Design
//!
//! Records are keyed by transaction ID. Two secondary indexes are kept:
//! - per account, the IDs in append order (used for ledger replay and audits)
//! - per cancelled use, the ID of the cancel that reversed it
//!
//! # Thread Safety
//!
//! Appends for different accounts proceed concurrently through DashMap's
//! sharding. Appends for the same account are already serialized by the
//! account lock, so the per-account order matches the lock order.

use crate::core::traits::TransactionLog;
use crate::types::{AccountError, TransactionId, TransactionRecord};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe in-memory implementation of [`TransactionLog`]
#[derive(Debug)]
pub struct InMemoryTransactionLog {
    records: DashMap<TransactionId, TransactionRecord>,

    /// Account number to record IDs, in append order
    by_account: DashMap<String, Vec<TransactionId>>,

    /// Cancelled use ID to the cancel's ID
    cancellations: DashMap<TransactionId, TransactionId>,
}

impl InMemoryTransactionLog {
    /// Create a new empty log
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            by_account: DashMap::new(),
            cancellations: DashMap::new(),
        }
    }

    /// Number of records in the log
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every record, grouped by account number and in append order per account
    pub fn all_records(&self) -> Vec<TransactionRecord> {
        let mut accounts: Vec<String> = self
            .by_account
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        accounts.sort();

        accounts
            .iter()
            .flat_map(|account| self.records_for(account))
            .collect()
    }

    fn records_for(&self, account_number: &str) -> Vec<TransactionRecord> {
        let ids = self
            .by_account
            .get(account_number)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        ids.iter()
            .filter_map(|id| self.records.get(id).map(|entry| entry.value().clone()))
            .collect()
    }
}

impl Default for InMemoryTransactionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn save_transaction(
        &self,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, AccountError> {
        match self.records.entry(record.transaction_id.clone()) {
            Entry::Occupied(_) => {
                return Err(AccountError::internal(format!(
                    "duplicate transaction id {}",
                    record.transaction_id
                )))
            }
            Entry::Vacant(entry) => {
                entry.insert(record.clone());
            }
        }

        self.by_account
            .entry(record.account_number.clone())
            .or_default()
            .push(record.transaction_id.clone());

        if let Some(original) = record.cancels.as_ref().filter(|_| record.succeeded()) {
            self.cancellations
                .insert(original.clone(), record.transaction_id.clone());
        }

        Ok(record)
    }

    fn find_transaction_by_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError> {
        Ok(self
            .records
            .get(transaction_id)
            .map(|entry| entry.value().clone()))
    }

    fn find_by_account(
        &self,
        account_number: &str,
    ) -> Result<Vec<TransactionRecord>, AccountError> {
        Ok(self.records_for(account_number))
    }

    fn find_cancellation_of(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError> {
        let cancel_id = match self.cancellations.get(transaction_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        self.find_transaction_by_id(&cancel_id)
    }

    fn contains(&self, transaction_id: &TransactionId) -> Result<bool, AccountError> {
        Ok(self.records.contains_key(transaction_id))
    }
}
