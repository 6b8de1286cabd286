//! Balance-mutating transaction logic
//!
//! This module provides the `TransactionEngine`, which validates and applies
//! uses (debits) and cancels (credits) against the balance ledger and appends
//! the matching ledger record.
//!
//! # Design
//!
//! The engine holds no locks itself. Its `use_balance` and `cancel_balance`
//! methods are the critical sections: [`crate::core::TransactionService`] runs
//! them while holding the account's lock, so every balance read used for
//! validation and the write that follows happen under the same lock.
//!
//! # Architecture
//!
//! ```text
//! TransactionEngine
//!     ├── Arc<dyn BalanceLedger>   (accounts, users, balances)
//!     ├── Arc<dyn TransactionLog>  (append-only records)
//!     └── TransactionConfig        (amount bounds)
//! ```
//!
//! # Atomicity
//!
//! A successful operation persists the account first and the record second.
//! If the record cannot be appended the previous account state is restored,
//! so a failed operation never leaves a changed balance without its record.

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::TransactionConfig;
use crate::core::id_generator::next_transaction_id;
use crate::core::traits::{BalanceLedger, TransactionLog};
use crate::types::{
    Account, AccountError, AccountUser, Amount, TransactionId, TransactionRecord,
    TransactionResult, TransactionType, UserId,
};

/// Applies uses and cancels to the ledger
///
/// Cloning is cheap: the collaborators are shared through `Arc`.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    ledger: Arc<dyn BalanceLedger>,
    log: Arc<dyn TransactionLog>,
    config: TransactionConfig,
    id_attempts: u32,
}

impl TransactionEngine {
    /// Create a new TransactionEngine
    ///
    /// # Arguments
    ///
    /// * `ledger` - Account and balance storage
    /// * `log` - Transaction record storage
    /// * `config` - Inclusive bounds on use amounts
    /// * `id_attempts` - Cap on attempts to draw an unused transaction ID
    pub fn new(
        ledger: Arc<dyn BalanceLedger>,
        log: Arc<dyn TransactionLog>,
        config: TransactionConfig,
        id_attempts: u32,
    ) -> Self {
        Self {
            ledger,
            log,
            config,
            id_attempts,
        }
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    /// Debit `amount` from an account on behalf of its owner
    ///
    /// Must run while holding the lock on `account_number`.
    ///
    /// Checks, in order (the first failure wins):
    /// 1. The user exists
    /// 2. The account exists
    /// 3. The user owns the account
    /// 4. The account is open
    /// 5. The balance covers `amount`
    /// 6. `amount` lies within the configured bounds
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The appended succeeded use record
    /// * `Err(AccountError)` - The failed check or storage fault; nothing was applied
    pub fn use_balance(
        &self,
        user_id: UserId,
        account_number: &str,
        amount: Amount,
    ) -> Result<TransactionRecord, AccountError> {
        let user = self
            .ledger
            .find_user_by_id(user_id)?
            .ok_or_else(|| AccountError::user_not_found(user_id))?;
        let account = self.find_account(account_number)?;

        self.validate_use(&user, &account, amount)?;

        let mut updated = account.clone();
        updated.debit(amount)?;

        let record = TransactionRecord::new(
            next_transaction_id(self.log.as_ref(), self.id_attempts)?,
            account_number,
            TransactionType::Use,
            TransactionResult::Succeeded,
            amount,
        );

        self.commit(account, updated, record)
    }

    fn validate_use(
        &self,
        user: &AccountUser,
        account: &Account,
        amount: Amount,
    ) -> Result<(), AccountError> {
        if user.id != account.owner {
            return Err(AccountError::account_user_mismatched(
                &account.account_number,
                user.id,
            ));
        }
        if account.is_closed() {
            return Err(AccountError::account_closed(&account.account_number));
        }
        if account.balance < amount {
            return Err(AccountError::balance_not_enough(
                &account.account_number,
                account.balance,
                amount,
            ));
        }
        if !self.config.contains(amount) {
            return Err(AccountError::amount_not_valid(amount));
        }
        Ok(())
    }

    /// Reverse a previous successful use, crediting its amount back
    ///
    /// Must run while holding the lock on `account_number`.
    ///
    /// Checks, in order (the first failure wins):
    /// 1. The original transaction exists
    /// 2. The account exists
    /// 3. `amount` equals the original amount
    /// 4. The original belongs to this account
    /// 5. The original is a succeeded use that has not been cancelled yet
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionRecord)` - The appended succeeded cancel record
    /// * `Err(AccountError)` - The failed check or storage fault; nothing was applied
    pub fn cancel_balance(
        &self,
        transaction_id: &TransactionId,
        account_number: &str,
        amount: Amount,
    ) -> Result<TransactionRecord, AccountError> {
        let original = self.find_transaction(transaction_id)?;
        let account = self.find_account(account_number)?;

        self.validate_cancel(&original, &account, amount)?;

        let mut updated = account.clone();
        updated.credit(amount)?;

        let record = TransactionRecord::new(
            next_transaction_id(self.log.as_ref(), self.id_attempts)?,
            account_number,
            TransactionType::Cancel,
            TransactionResult::Succeeded,
            amount,
        )
        .cancelling(original.transaction_id.clone());

        self.commit(account, updated, record)
    }

    fn validate_cancel(
        &self,
        original: &TransactionRecord,
        account: &Account,
        amount: Amount,
    ) -> Result<(), AccountError> {
        let original_id = original.transaction_id.as_str();

        if original.amount != amount {
            return Err(AccountError::amount_mismatched(
                original_id,
                original.amount,
                amount,
            ));
        }
        if original.account_number != account.account_number {
            return Err(AccountError::account_mismatched(
                original_id,
                &original.account_number,
                &account.account_number,
            ));
        }
        if original.transaction_type != TransactionType::Use || !original.succeeded() {
            return Err(AccountError::invalid_request(format!(
                "transaction {} is not a succeeded use",
                original_id
            )));
        }
        if let Some(cancel) = self.log.find_cancellation_of(&original.transaction_id)? {
            return Err(AccountError::invalid_request(format!(
                "transaction {} was already cancelled by {}",
                original_id, cancel.transaction_id
            )));
        }
        Ok(())
    }

    /// Look up a transaction record
    ///
    /// A pure read, no lock required.
    pub fn inquiry(&self, transaction_id: &TransactionId) -> Result<TransactionRecord, AccountError> {
        self.find_transaction(transaction_id)
    }

    fn find_account(&self, account_number: &str) -> Result<Account, AccountError> {
        self.ledger
            .find_account_by_number(account_number)?
            .ok_or_else(|| AccountError::account_not_found(account_number))
    }

    fn find_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<TransactionRecord, AccountError> {
        self.log
            .find_transaction_by_id(transaction_id)?
            .ok_or_else(|| AccountError::transaction_not_found(transaction_id.as_str()))
    }

    /// Persist the updated account, then append its record
    ///
    /// Restores `previous` if the append fails.
    fn commit(
        &self,
        previous: Account,
        updated: Account,
        record: TransactionRecord,
    ) -> Result<TransactionRecord, AccountError> {
        let balance = updated.balance;
        self.ledger.save_account(updated)?;

        match self.log.save_transaction(record) {
            Ok(record) => {
                debug!(
                    transaction_id = %record.transaction_id,
                    account = %record.account_number,
                    kind = record.transaction_type.as_str(),
                    amount = record.amount,
                    balance,
                    "Transaction committed"
                );
                Ok(record)
            }
            Err(err) => {
                let account_number = previous.account_number.clone();
                if let Err(restore_err) = self.ledger.save_account(previous) {
                    error!(
                        account = %account_number,
                        error = %restore_err,
                        "Failed to restore account after ledger append failure"
                    );
                }
                Err(err)
            }
        }
    }
}
