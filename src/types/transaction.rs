//! Transaction-related types
//!
//! This module defines the ledger record appended for every balance-mutating
//! attempt, together with its type, result, and identifier.

use super::account::{AccountNumber, Amount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, collision-free transaction identifier
///
/// Generated identifiers are 32 lowercase hex characters (a v4 UUID without
/// hyphens), but any string received from a caller is accepted for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh random identifier
    ///
    /// Uniqueness against the log is established by the caller, see
    /// [`crate::core::id_generator`].
    pub fn generate() -> Self {
        TransactionId(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        TransactionId(value.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        TransactionId(value)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Balance operations recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Debit the account balance
    Use,

    /// Reverse a previous successful use, crediting the balance back
    Cancel,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Use => "use",
            TransactionType::Cancel => "cancel",
        }
    }
}

/// Outcome recorded on a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionResult {
    Succeeded,
    Failed,
}

impl TransactionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionResult::Succeeded => "succeeded",
            TransactionResult::Failed => "failed",
        }
    }
}

/// Append-only ledger entry
///
/// Once written to the transaction log a record is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,

    /// Account the record applies to
    pub account_number: AccountNumber,

    pub transaction_type: TransactionType,

    pub result: TransactionResult,

    /// Amount in minor units (never negative)
    pub amount: Amount,

    pub transacted_at: DateTime<Utc>,

    /// For a successful cancel, the use it reverses
    ///
    /// The referenced use always has the same amount and account number.
    pub cancels: Option<TransactionId>,
}

impl TransactionRecord {
    /// Build a record stamped with the current time
    pub fn new(
        transaction_id: TransactionId,
        account_number: impl Into<AccountNumber>,
        transaction_type: TransactionType,
        result: TransactionResult,
        amount: Amount,
    ) -> Self {
        TransactionRecord {
            transaction_id,
            account_number: account_number.into(),
            transaction_type,
            result,
            amount,
            transacted_at: Utc::now(),
            cancels: None,
        }
    }

    /// Link this record to the use it reverses
    pub fn cancelling(mut self, original: TransactionId) -> Self {
        self.cancels = Some(original);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.result == TransactionResult::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_32_hex_chars() {
        let id = TransactionId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(TransactionId::generate(), TransactionId::generate());
    }

    #[test]
    fn test_cancelling_links_original() {
        let original = TransactionId::from("abc");
        let record = TransactionRecord::new(
            TransactionId::from("def"),
            "1000000000",
            TransactionType::Cancel,
            TransactionResult::Succeeded,
            200,
        )
        .cancelling(original.clone());

        assert_eq!(record.cancels, Some(original));
        assert!(record.succeeded());
    }
}
