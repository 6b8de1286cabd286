//! Account-related types
//!
//! This module defines the Account structure, its lifecycle status, and the
//! balance mutations that are only ever applied while the account's lock is held.

use super::error::AccountError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account holder identifier
pub type UserId = u64;

/// Account number, the stable external key of an account
///
/// Also the granularity of mutual exclusion: every balance mutation is
/// serialized on this value.
pub type AccountNumber = String;

/// Monetary amount in currency minor units
pub type Amount = i64;

/// An account holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUser {
    pub id: UserId,
    pub name: String,
}

impl AccountUser {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Lifecycle status of an account
///
/// Closing is a status transition, accounts are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Open,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Open => "open",
            AccountStatus::Closed => "closed",
        }
    }
}

/// Account state as owned by the balance ledger
///
/// The balance never goes below zero. Both [`Account::debit`] and
/// [`Account::credit`] use checked arithmetic and leave the account untouched
/// when they fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Ledger-assigned identifier
    pub id: u64,

    /// The user who owns this account
    pub owner: UserId,

    /// Unique account number (the lock key)
    pub account_number: AccountNumber,

    /// Current balance in minor units
    pub balance: Amount,

    pub status: AccountStatus,

    pub opened_at: DateTime<Utc>,

    /// Absent while the account is open
    pub closed_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new open account
    ///
    /// # Arguments
    ///
    /// * `id` - Ledger-assigned identifier
    /// * `owner` - The owning user's ID
    /// * `account_number` - Unique account number
    /// * `balance` - Opening balance in minor units
    pub fn open(
        id: u64,
        owner: UserId,
        account_number: impl Into<AccountNumber>,
        balance: Amount,
    ) -> Self {
        Account {
            id,
            owner,
            account_number: account_number.into(),
            balance,
            status: AccountStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == AccountStatus::Closed
    }

    /// Subtract `amount` from the balance
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The balance was debited
    /// * `Err(AccountError::AmountNotValid)` - If `amount` is negative
    /// * `Err(AccountError::BalanceNotEnough)` - If the balance would go negative
    pub fn debit(&mut self, amount: Amount) -> Result<(), AccountError> {
        if amount < 0 {
            return Err(AccountError::amount_not_valid(amount));
        }
        if amount > self.balance {
            return Err(AccountError::balance_not_enough(
                &self.account_number,
                self.balance,
                amount,
            ));
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to the balance
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The balance was credited
    /// * `Err(AccountError::AmountNotValid)` - If `amount` is negative
    /// * `Err(AccountError::ArithmeticOverflow)` - If the balance would overflow
    pub fn credit(&mut self, amount: Amount) -> Result<(), AccountError> {
        if amount < 0 {
            return Err(AccountError::amount_not_valid(amount));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| AccountError::arithmetic_overflow("credit", &self.account_number))?;
        Ok(())
    }

    /// Mark the account closed as of now
    pub fn close(&mut self) {
        self.status = AccountStatus::Closed;
        self.closed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;
    use rstest::rstest;

    #[test]
    fn test_open_creates_open_account_without_closed_at() {
        let account = Account::open(1, 7, "1000000000", 500);

        assert_eq!(account.owner, 7);
        assert_eq!(account.account_number, "1000000000");
        assert_eq!(account.balance, 500);
        assert_eq!(account.status, AccountStatus::Open);
        assert!(account.closed_at.is_none());
    }

    #[rstest]
    #[case::partial(10000, 200, 9800)]
    #[case::entire_balance(500, 500, 0)]
    #[case::zero_amount(500, 0, 500)]
    fn test_debit(#[case] balance: Amount, #[case] amount: Amount, #[case] expected: Amount) {
        let mut account = Account::open(1, 1, "1000000000", balance);
        account.debit(amount).unwrap();
        assert_eq!(account.balance, expected);
    }

    #[rstest]
    #[case::more_than_balance(100, 101, ErrorCode::BalanceNotEnough)]
    #[case::negative(100, -1, ErrorCode::AmountNotValid)]
    fn test_debit_rejected_leaves_balance(
        #[case] balance: Amount,
        #[case] amount: Amount,
        #[case] code: ErrorCode,
    ) {
        let mut account = Account::open(1, 1, "1000000000", balance);
        let err = account.debit(amount).unwrap_err();
        assert_eq!(err.code(), code);
        assert_eq!(account.balance, balance);
    }

    #[test]
    fn test_credit_rejects_negative_amount() {
        let mut account = Account::open(1, 1, "1000000000", 100);
        let err = account.credit(-5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AmountNotValid);
        assert_eq!(account.balance, 100);
    }

    #[test]
    fn test_credit_overflow() {
        let mut account = Account::open(1, 1, "1000000000", Amount::MAX);
        let err = account.credit(1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(account.balance, Amount::MAX);
    }

    #[test]
    fn test_close_sets_status_and_timestamp() {
        let mut account = Account::open(1, 1, "1000000000", 0);
        account.close();
        assert!(account.is_closed());
        assert!(account.closed_at.is_some());
    }
}
