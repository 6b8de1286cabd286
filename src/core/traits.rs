//! Collaborator traits for balance storage and the transaction log
//!
//! The engine, audit recorder, and account service receive these as
//! `Arc<dyn ...>` in their constructors, so durable storage can be swapped
//! without touching business logic. The in-memory implementations live in
//! [`crate::core::ledger`] and [`crate::core::transaction_log`].

use crate::types::{
    Account, AccountError, AccountUser, TransactionId, TransactionRecord, UserId,
};
use std::fmt::Debug;

/// Durable store of account holders, accounts, and balances
///
/// Implementations must make `save_account` atomic: balance and status are
/// persisted together or not at all.
pub trait BalanceLedger: Send + Sync + Debug {
    /// Look up an account holder
    fn find_user_by_id(&self, user_id: UserId) -> Result<Option<AccountUser>, AccountError>;

    /// Register or replace an account holder
    fn save_user(&self, user: AccountUser) -> Result<AccountUser, AccountError>;

    /// Look up an account by its number
    fn find_account_by_number(&self, account_number: &str)
        -> Result<Option<Account>, AccountError>;

    /// Insert or replace an account, keyed by account number
    fn save_account(&self, account: Account) -> Result<Account, AccountError>;

    /// All accounts owned by a user, ordered by account number
    fn find_accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, AccountError>;

    /// Number of open accounts owned by a user
    fn count_open_accounts(&self, user_id: UserId) -> Result<usize, AccountError>;

    /// Snapshot of every account, ordered by account number
    fn all_accounts(&self) -> Result<Vec<Account>, AccountError>;

    /// Reserve the next account identifier
    fn next_account_id(&self) -> u64;
}

/// Durable, append-only store of transaction records
///
/// Appends for different accounts may arrive concurrently. Appends for the
/// same account arrive in lock order and must be kept in that order.
pub trait TransactionLog: Send + Sync + Debug {
    /// Append a record
    ///
    /// Appending an identifier that already exists is an error.
    fn save_transaction(&self, record: TransactionRecord)
        -> Result<TransactionRecord, AccountError>;

    /// Look up a record by identifier
    fn find_transaction_by_id(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError>;

    /// All records of an account, in append order
    fn find_by_account(&self, account_number: &str)
        -> Result<Vec<TransactionRecord>, AccountError>;

    /// The successful cancel that reverses `transaction_id`, if any
    fn find_cancellation_of(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<TransactionRecord>, AccountError>;

    fn contains(&self, transaction_id: &TransactionId) -> Result<bool, AccountError> {
        Ok(self.find_transaction_by_id(transaction_id)?.is_some())
    }
}
