//! Lock-protected transaction operations
//!
//! This module provides the `TransactionService`, the entry point callers use
//! for uses, cancels, and inquiries.
//!
//! # Design
//!
//! The service is a decorator around [`TransactionEngine`]: it asks the request
//! for its lock key through [`LockKey`], runs the engine's critical section
//! while holding that key in the [`KeyedLockManager`], and forwards the
//! engine's error unchanged. After the lock is released, a failed use or
//! cancel is handed to the [`AuditRecorder`].
//!
//! ```text
//! use/cancel ─→ acquire(lock_key) ─→ engine critical section ─→ release
//!                     │                          │
//!                     └── timeout ──┬── error ───┘
//!                                   ↓
//!                     AuditRecorder (FAILED record, no lock)
//! ```
//!
//! If the audit itself fails (for example because the account does not
//! exist), that secondary error is what the caller receives; the original
//! cause is logged alongside it.

use tracing::{error, info};

use crate::core::{AuditRecorder, KeyedLockManager, TransactionEngine};
use crate::types::{
    AccountError, Amount, CancelTransaction, LockKey, TransactionId, TransactionRecord,
    TransactionType, UseTransaction,
};

/// Entry point for balance-mutating operations
///
/// Cloning is cheap and clones share the same lock table and storage, so one
/// service can be handed to many concurrent tasks.
#[derive(Debug, Clone)]
pub struct TransactionService {
    engine: TransactionEngine,
    audit: AuditRecorder,
    locks: KeyedLockManager,
}

impl TransactionService {
    pub fn new(engine: TransactionEngine, audit: AuditRecorder, locks: KeyedLockManager) -> Self {
        Self {
            engine,
            audit,
            locks,
        }
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.audit
    }

    pub fn locks(&self) -> &KeyedLockManager {
        &self.locks
    }

    /// Debit an account under its lock
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The succeeded use record
    /// * `Err(AccountError)` - The rejection, lock timeout, or audit failure;
    ///   a FAILED use record has been appended if the account exists and
    ///   the amount is not negative
    pub async fn use_transaction(
        &self,
        request: &UseTransaction,
    ) -> Result<TransactionRecord, AccountError> {
        let result = self
            .locked(request, || {
                self.engine
                    .use_balance(request.user_id, &request.account_number, request.amount)
            })
            .await;

        result.map_err(|cause| {
            self.audit_failure(
                TransactionType::Use,
                &request.account_number,
                request.amount,
                cause,
            )
        })
    }

    /// Reverse a previous use under the account's lock
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The succeeded cancel record
    /// * `Err(AccountError)` - The rejection, lock timeout, or audit failure;
    ///   a FAILED cancel record has been appended if the account exists and
    ///   the amount is not negative
    pub async fn cancel_transaction(
        &self,
        request: &CancelTransaction,
    ) -> Result<TransactionRecord, AccountError> {
        let result = self
            .locked(request, || {
                self.engine.cancel_balance(
                    &request.transaction_id,
                    &request.account_number,
                    request.amount,
                )
            })
            .await;

        result.map_err(|cause| {
            self.audit_failure(
                TransactionType::Cancel,
                &request.account_number,
                request.amount,
                cause,
            )
        })
    }

    /// Look up a transaction record without locking
    pub fn inquiry_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, AccountError> {
        self.engine.inquiry(transaction_id)
    }

    async fn locked<R, T, F>(&self, request: &R, critical_section: F) -> Result<T, AccountError>
    where
        R: LockKey + ?Sized,
        F: FnOnce() -> Result<T, AccountError>,
    {
        self.locks
            .run_locked(request.lock_key(), move || async move { critical_section() })
            .await
    }

    fn audit_failure(
        &self,
        transaction_type: TransactionType,
        account_number: &str,
        amount: Amount,
        cause: AccountError,
    ) -> AccountError {
        info!(
            account = account_number,
            kind = transaction_type.as_str(),
            amount,
            code = %cause.code(),
            error = %cause,
            "Transaction failed"
        );

        let audited = match transaction_type {
            TransactionType::Use => self.audit.record_failed_use(account_number, amount),
            TransactionType::Cancel => self.audit.record_failed_cancel(account_number, amount),
        };

        match audited {
            Ok(_) => cause,
            Err(audit_err) => {
                error!(
                    account = account_number,
                    kind = transaction_type.as_str(),
                    cause = %cause,
                    error = %audit_err,
                    "Failed to record failed transaction"
                );
                audit_err
            }
        }
    }
}
