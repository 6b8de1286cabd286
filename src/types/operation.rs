//! Replay inputs: seeded accounts and scripted operations

use super::account::{AccountNumber, AccountStatus, Amount, UserId};

/// An account to create before any operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSeed {
    pub user: UserId,
    pub account_number: AccountNumber,
    pub balance: Amount,
    pub status: AccountStatus,
}

/// One scripted call against the services
///
/// `label` and `reference` are caller-chosen names for transactions: a use
/// with a label can be cancelled or inquired later by passing the same name
/// as `reference`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Use {
        user: UserId,
        account_number: AccountNumber,
        label: Option<String>,
        amount: Amount,
    },
    Cancel {
        reference: String,
        account_number: AccountNumber,
        amount: Amount,
    },
    Close {
        user: UserId,
        account_number: AccountNumber,
    },
    Inquiry {
        reference: String,
    },
}

impl Operation {
    /// The account the operation locks, if any
    pub fn account_number(&self) -> Option<&str> {
        match self {
            Operation::Use { account_number, .. }
            | Operation::Cancel { account_number, .. }
            | Operation::Close { account_number, .. } => Some(account_number),
            Operation::Inquiry { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Use { .. } => "use",
            Operation::Cancel { .. } => "cancel",
            Operation::Close { .. } => "close",
            Operation::Inquiry { .. } => "inquiry",
        }
    }
}
