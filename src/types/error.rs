//! Error types for account and transaction operations
//!
//! Every failure surfaces as an [`AccountError`] carrying enough context to
//! diagnose it, and maps onto a stable [`ErrorCode`] with a human-readable
//! description for callers.
//!
//! # Error Categories
//!
//! - **Business rule violations**: user/account/transaction not found, owner or
//!   amount mismatches, closed accounts, insufficient balance. Retrying with the
//!   same inputs fails identically.
//! - **Lock contention**: `AccountTransactionLocked`, the only retryable error.
//! - **Internal faults**: storage failures, arithmetic overflow, identifier
//!   generation exhaustion.

use super::account::{Amount, UserId};
use serde::Serialize;
use thiserror::Error;

/// Stable error codes exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UserNotFound,
    ReachedAccountPerUserLimit,
    AccountNotFound,
    #[serde(rename = "ACCOUNTUSER_MISMATCHED")]
    AccountUserMismatched,
    AccountClosed,
    BalanceNotZero,
    BalanceNotEnough,
    AmountNotValid,
    TransactionNotFound,
    AmountMismatched,
    AccountMismatched,
    AccountTransactionLocked,
    IdGenerationExhausted,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    /// The wire form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::ReachedAccountPerUserLimit => "REACHED_ACCOUNT_PER_USER_LIMIT",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::AccountUserMismatched => "ACCOUNTUSER_MISMATCHED",
            ErrorCode::AccountClosed => "ACCOUNT_CLOSED",
            ErrorCode::BalanceNotZero => "BALANCE_NOT_ZERO",
            ErrorCode::BalanceNotEnough => "BALANCE_NOT_ENOUGH",
            ErrorCode::AmountNotValid => "AMOUNT_NOT_VALID",
            ErrorCode::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ErrorCode::AmountMismatched => "AMOUNT_MISMATCHED",
            ErrorCode::AccountMismatched => "ACCOUNT_MISMATCHED",
            ErrorCode::AccountTransactionLocked => "ACCOUNT_TRANSACTION_LOCKED",
            ErrorCode::IdGenerationExhausted => "ID_GENERATION_EXHAUSTED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Human-readable description shown to callers
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::ReachedAccountPerUserLimit => "User has reached the account limit",
            ErrorCode::AccountNotFound => "Account not found",
            ErrorCode::AccountUserMismatched => "User is not the owner of the account",
            ErrorCode::AccountClosed => "Account is closed",
            ErrorCode::BalanceNotZero => "Account balance is not zero",
            ErrorCode::BalanceNotEnough => "Account balance is not enough",
            ErrorCode::AmountNotValid => "Transaction amount is not valid",
            ErrorCode::TransactionNotFound => "Transaction not found",
            ErrorCode::AmountMismatched => "Transaction amount does not match",
            ErrorCode::AccountMismatched => "Transaction account does not match",
            ErrorCode::AccountTransactionLocked => {
                "Another transaction on this account is in progress"
            }
            ErrorCode::IdGenerationExhausted => "Could not generate a unique identifier",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for account and transaction operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountError {
    /// The requesting user does not exist
    #[error("User {user_id} not found")]
    UserNotFound { user_id: UserId },

    /// The user already holds the maximum number of open accounts
    #[error("User {user_id} has reached the limit of {limit} open accounts")]
    ReachedAccountPerUserLimit { user_id: UserId, limit: usize },

    /// No account with this number exists
    #[error("Account {account_number} not found")]
    AccountNotFound { account_number: String },

    /// The account is owned by somebody other than the requesting user
    #[error("User {user_id} does not own account {account_number}")]
    AccountUserMismatched {
        account_number: String,
        user_id: UserId,
    },

    /// The account is closed and accepts no transactions
    #[error("Account {account_number} is closed")]
    AccountClosed { account_number: String },

    /// The account cannot be closed while it still holds funds
    #[error("Account {account_number} still holds a balance of {balance}")]
    BalanceNotZero {
        account_number: String,
        balance: Amount,
    },

    /// The balance does not cover the requested debit
    ///
    /// The balance is left untouched.
    #[error(
        "Insufficient balance on account {account_number}: balance {balance}, requested {requested}"
    )]
    BalanceNotEnough {
        account_number: String,
        balance: Amount,
        requested: Amount,
    },

    /// The amount is negative or outside the configured bounds
    #[error("Transaction amount {amount} is not valid")]
    AmountNotValid { amount: Amount },

    /// No transaction with this identifier exists
    #[error("Transaction {transaction_id} not found")]
    TransactionNotFound { transaction_id: String },

    /// A cancel amount differs from the original transaction's amount
    #[error("Amount mismatch for transaction {transaction_id}: expected {expected}, got {actual}")]
    AmountMismatched {
        transaction_id: String,
        expected: Amount,
        actual: Amount,
    },

    /// A cancel names a different account than the original transaction
    #[error(
        "Account mismatch for transaction {transaction_id}: expected {expected_account}, got {actual_account}"
    )]
    AccountMismatched {
        transaction_id: String,
        expected_account: String,
        actual_account: String,
    },

    /// The account lock could not be acquired within the wait budget
    ///
    /// This is the only retryable error: nothing was applied.
    #[error("Account {account_number} is locked by another transaction")]
    AccountTransactionLocked { account_number: String },

    /// No unique identifier was found within the retry cap
    #[error("Could not generate a unique {kind} after {attempts} attempts")]
    IdGenerationExhausted { kind: String, attempts: u32 },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} on account {account_number}")]
    ArithmeticOverflow {
        operation: String,
        account_number: String,
    },

    /// The request is malformed or not applicable
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Storage or other unexpected fault
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AccountError {
    /// Stable code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AccountError::UserNotFound { .. } => ErrorCode::UserNotFound,
            AccountError::ReachedAccountPerUserLimit { .. } => {
                ErrorCode::ReachedAccountPerUserLimit
            }
            AccountError::AccountNotFound { .. } => ErrorCode::AccountNotFound,
            AccountError::AccountUserMismatched { .. } => ErrorCode::AccountUserMismatched,
            AccountError::AccountClosed { .. } => ErrorCode::AccountClosed,
            AccountError::BalanceNotZero { .. } => ErrorCode::BalanceNotZero,
            AccountError::BalanceNotEnough { .. } => ErrorCode::BalanceNotEnough,
            AccountError::AmountNotValid { .. } => ErrorCode::AmountNotValid,
            AccountError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            AccountError::AmountMismatched { .. } => ErrorCode::AmountMismatched,
            AccountError::AccountMismatched { .. } => ErrorCode::AccountMismatched,
            AccountError::AccountTransactionLocked { .. } => ErrorCode::AccountTransactionLocked,
            AccountError::IdGenerationExhausted { .. } => ErrorCode::IdGenerationExhausted,
            AccountError::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            AccountError::ArithmeticOverflow { .. } | AccountError::Internal { .. } => {
                ErrorCode::InternalError
            }
        }
    }

    /// Human-readable description of this error's code
    pub fn description(&self) -> &'static str {
        self.code().description()
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountError::AccountTransactionLocked { .. })
    }
}

// Helper functions for creating common errors

impl AccountError {
    pub fn user_not_found(user_id: UserId) -> Self {
        AccountError::UserNotFound { user_id }
    }

    pub fn account_not_found(account_number: &str) -> Self {
        AccountError::AccountNotFound {
            account_number: account_number.to_string(),
        }
    }

    pub fn account_user_mismatched(account_number: &str, user_id: UserId) -> Self {
        AccountError::AccountUserMismatched {
            account_number: account_number.to_string(),
            user_id,
        }
    }

    pub fn account_closed(account_number: &str) -> Self {
        AccountError::AccountClosed {
            account_number: account_number.to_string(),
        }
    }

    pub fn balance_not_zero(account_number: &str, balance: Amount) -> Self {
        AccountError::BalanceNotZero {
            account_number: account_number.to_string(),
            balance,
        }
    }

    pub fn balance_not_enough(account_number: &str, balance: Amount, requested: Amount) -> Self {
        AccountError::BalanceNotEnough {
            account_number: account_number.to_string(),
            balance,
            requested,
        }
    }

    pub fn amount_not_valid(amount: Amount) -> Self {
        AccountError::AmountNotValid { amount }
    }

    pub fn transaction_not_found(transaction_id: &str) -> Self {
        AccountError::TransactionNotFound {
            transaction_id: transaction_id.to_string(),
        }
    }

    pub fn amount_mismatched(transaction_id: &str, expected: Amount, actual: Amount) -> Self {
        AccountError::AmountMismatched {
            transaction_id: transaction_id.to_string(),
            expected,
            actual,
        }
    }

    pub fn account_mismatched(
        transaction_id: &str,
        expected_account: &str,
        actual_account: &str,
    ) -> Self {
        AccountError::AccountMismatched {
            transaction_id: transaction_id.to_string(),
            expected_account: expected_account.to_string(),
            actual_account: actual_account.to_string(),
        }
    }

    pub fn transaction_locked(account_number: &str) -> Self {
        AccountError::AccountTransactionLocked {
            account_number: account_number.to_string(),
        }
    }

    pub fn id_generation_exhausted(kind: &str, attempts: u32) -> Self {
        AccountError::IdGenerationExhausted {
            kind: kind.to_string(),
            attempts,
        }
    }

    pub fn arithmetic_overflow(operation: &str, account_number: &str) -> Self {
        AccountError::ArithmeticOverflow {
            operation: operation.to_string(),
            account_number: account_number.to_string(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AccountError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AccountError::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::user_not_found(AccountError::user_not_found(7), "User 7 not found")]
    #[case::account_not_found(
        AccountError::account_not_found("1000000000"),
        "Account 1000000000 not found"
    )]
    #[case::balance_not_enough(
        AccountError::balance_not_enough("1000000000", 100, 200),
        "Insufficient balance on account 1000000000: balance 100, requested 200"
    )]
    #[case::amount_mismatched(
        AccountError::amount_mismatched("abc", 200, 300),
        "Amount mismatch for transaction abc: expected 200, got 300"
    )]
    #[case::account_mismatched(
        AccountError::account_mismatched("abc", "1000000000", "2000000000"),
        "Account mismatch for transaction abc: expected 1000000000, got 2000000000"
    )]
    #[case::locked(
        AccountError::transaction_locked("1000000000"),
        "Account 1000000000 is locked by another transaction"
    )]
    #[case::id_exhausted(
        AccountError::id_generation_exhausted("transaction id", 10),
        "Could not generate a unique transaction id after 10 attempts"
    )]
    fn test_error_display(#[case] error: AccountError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case(AccountError::user_not_found(1), "USER_NOT_FOUND")]
    #[case(AccountError::account_user_mismatched("1", 1), "ACCOUNTUSER_MISMATCHED")]
    #[case(AccountError::balance_not_zero("1", 5), "BALANCE_NOT_ZERO")]
    #[case(AccountError::amount_not_valid(99), "AMOUNT_NOT_VALID")]
    #[case(AccountError::transaction_locked("1"), "ACCOUNT_TRANSACTION_LOCKED")]
    #[case(AccountError::arithmetic_overflow("credit", "1"), "INTERNAL_ERROR")]
    #[case(AccountError::internal("disk full"), "INTERNAL_ERROR")]
    #[case(AccountError::invalid_request("bad"), "INVALID_REQUEST")]
    fn test_error_codes(#[case] error: AccountError, #[case] code: &str) {
        assert_eq!(error.code().as_str(), code);
        assert!(!error.description().is_empty());
    }

    #[test]
    fn test_only_lock_timeout_is_retryable() {
        assert!(AccountError::transaction_locked("1").is_retryable());
        assert!(!AccountError::balance_not_enough("1", 0, 1).is_retryable());
        assert!(!AccountError::internal("boom").is_retryable());
    }
}
