//! Failure audit trail
//!
//! The `AuditRecorder` appends a FAILED record for a use or cancel attempt
//! that did not complete. It runs after the account lock has been released and
//! does not touch balances, so it takes no lock of its own.
//!
//! Recording is best-effort and not atomic with the failure it documents. The
//! attempt is not re-validated: the only requirement is that the account still
//! resolves, and if it does not, `AccountNotFound` is returned to the caller
//! rather than hidden. A negative amount is never recorded: it fails with
//! `AmountNotValid` and the log is left untouched.

use std::sync::Arc;

use tracing::debug;

use crate::core::id_generator::next_transaction_id;
use crate::core::traits::{BalanceLedger, TransactionLog};
use crate::types::{AccountError, Amount, TransactionRecord, TransactionResult, TransactionType};

/// Appends FAILED records for unsuccessful attempts
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    ledger: Arc<dyn BalanceLedger>,
    log: Arc<dyn TransactionLog>,
    id_attempts: u32,
}

impl AuditRecorder {
    pub fn new(ledger: Arc<dyn BalanceLedger>, log: Arc<dyn TransactionLog>, id_attempts: u32) -> Self {
        Self {
            ledger,
            log,
            id_attempts,
        }
    }

    /// Record a failed use of `amount` on `account_number`
    pub fn record_failed_use(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<TransactionRecord, AccountError> {
        self.record_failed(TransactionType::Use, account_number, amount)
    }

    /// Record a failed cancel of `amount` on `account_number`
    pub fn record_failed_cancel(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<TransactionRecord, AccountError> {
        self.record_failed(TransactionType::Cancel, account_number, amount)
    }

    fn record_failed(
        &self,
        transaction_type: TransactionType,
        account_number: &str,
        amount: Amount,
    ) -> Result<TransactionRecord, AccountError> {
        if amount < 0 {
            return Err(AccountError::amount_not_valid(amount));
        }
        let account = self
            .ledger
            .find_account_by_number(account_number)?
            .ok_or_else(|| AccountError::account_not_found(account_number))?;

        let record = self.log.save_transaction(TransactionRecord::new(
            next_transaction_id(self.log.as_ref(), self.id_attempts)?,
            account.account_number,
            transaction_type,
            TransactionResult::Failed,
            amount,
        ))?;

        debug!(
            transaction_id = %record.transaction_id,
            account = %record.account_number,
            kind = transaction_type.as_str(),
            amount,
            "Failed attempt recorded"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{seeded, USED_ACCOUNT};
    use crate::types::ErrorCode;
    use rstest::rstest;

    #[test]
    fn test_record_failed_use() {
        let (ledger, log) = seeded(10000);
        let audit = AuditRecorder::new(ledger.clone(), log.clone(), 10);

        let record = audit.record_failed_use(USED_ACCOUNT, 200).unwrap();

        assert_eq!(record.transaction_type, TransactionType::Use);
        assert_eq!(record.result, TransactionResult::Failed);
        assert_eq!(record.amount, 200);
        assert_eq!(record.account_number, USED_ACCOUNT);
        assert!(record.cancels.is_none());
        assert_eq!(log.len(), 1);

        let balance = ledger
            .find_account_by_number(USED_ACCOUNT)
            .unwrap()
            .unwrap()
            .balance;
        assert_eq!(balance, 10000);
    }

    #[test]
    fn test_record_failed_cancel() {
        let (ledger, log) = seeded(10000);
        let audit = AuditRecorder::new(ledger, log, 10);

        let record = audit.record_failed_cancel(USED_ACCOUNT, 300).unwrap();
        assert_eq!(record.transaction_type, TransactionType::Cancel);
        assert_eq!(record.result, TransactionResult::Failed);
        assert_eq!(record.amount, 300);
    }

    #[test]
    fn test_amount_is_recorded_without_validation() {
        let (ledger, log) = seeded(10000);
        let audit = AuditRecorder::new(ledger, log, 10);

        let record = audit.record_failed_use(USED_ACCOUNT, 1_000_000_000).unwrap();
        assert_eq!(record.amount, 1_000_000_000);
    }

    #[rstest]
    #[case::failed_use(TransactionType::Use)]
    #[case::failed_cancel(TransactionType::Cancel)]
    fn test_negative_amount_is_not_recorded(#[case] transaction_type: TransactionType) {
        let (ledger, log) = seeded(10000);
        let audit = AuditRecorder::new(ledger, log.clone(), 10);

        let err = match transaction_type {
            TransactionType::Use => audit.record_failed_use(USED_ACCOUNT, -5),
            TransactionType::Cancel => audit.record_failed_cancel(USED_ACCOUNT, -5),
        }
        .unwrap_err();

        assert_eq!(err, AccountError::amount_not_valid(-5));
        assert!(log.is_empty());
    }

    #[test]
    fn test_unknown_account_fails_loudly() {
        let (ledger, log) = seeded(10000);
        let audit = AuditRecorder::new(ledger, log.clone(), 10);

        let err = audit.record_failed_use("9999999999", 200).unwrap_err();

        assert_eq!(err.code(), ErrorCode::AccountNotFound);
        assert!(log.is_empty());
    }
}
