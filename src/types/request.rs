//! Requests for lock-protected operations
//!
//! Each request names the account it mutates through [`LockKey`], which is all
//! the locking decorator needs to know about it.

use super::account::{AccountNumber, Amount, UserId};
use super::transaction::TransactionId;

/// Requests that must run under their account's lock
pub trait LockKey {
    fn lock_key(&self) -> &str;
}

/// Debit `amount` from an account on behalf of its owner
#[derive(Debug, Clone, PartialEq)]
pub struct UseTransaction {
    pub user_id: UserId,
    pub account_number: AccountNumber,
    pub amount: Amount,
}

impl UseTransaction {
    pub fn new(user_id: UserId, account_number: impl Into<AccountNumber>, amount: Amount) -> Self {
        Self {
            user_id,
            account_number: account_number.into(),
            amount,
        }
    }
}

impl LockKey for UseTransaction {
    fn lock_key(&self) -> &str {
        &self.account_number
    }
}

/// Reverse a previous use
#[derive(Debug, Clone, PartialEq)]
pub struct CancelTransaction {
    pub transaction_id: TransactionId,
    pub account_number: AccountNumber,
    /// Must equal the original use's amount
    pub amount: Amount,
}

impl CancelTransaction {
    pub fn new(
        transaction_id: impl Into<TransactionId>,
        account_number: impl Into<AccountNumber>,
        amount: Amount,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            account_number: account_number.into(),
            amount,
        }
    }
}

impl LockKey for CancelTransaction {
    fn lock_key(&self) -> &str {
        &self.account_number
    }
}

/// Close an account with a zero balance
#[derive(Debug, Clone, PartialEq)]
pub struct CloseAccount {
    pub user_id: UserId,
    pub account_number: AccountNumber,
}

impl CloseAccount {
    pub fn new(user_id: UserId, account_number: impl Into<AccountNumber>) -> Self {
        Self {
            user_id,
            account_number: account_number.into(),
        }
    }
}

impl LockKey for CloseAccount {
    fn lock_key(&self) -> &str {
        &self.account_number
    }
}
