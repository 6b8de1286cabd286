//! Bounded generation of unique identifiers
//!
//! Account numbers and transaction IDs are drawn at random and checked against
//! storage. The number of draws is capped so a pathological collision rate
//! surfaces as `IdGenerationExhausted` instead of spinning forever.

use crate::core::traits::{BalanceLedger, TransactionLog};
use crate::types::{AccountError, AccountNumber, TransactionId};
use rand::Rng;
use tracing::warn;

/// Smallest generated account number (10 digits)
pub const ACCOUNT_NUMBER_MIN: u64 = 1_000_000_000;

/// Largest generated account number (10 digits)
pub const ACCOUNT_NUMBER_MAX: u64 = 9_999_999_999;

/// Draw candidates until one is not taken, at most `max_attempts` times
///
/// # Arguments
///
/// * `kind` - What is being generated, for the error message
/// * `max_attempts` - Maximum number of candidates to try
/// * `candidate` - Produces the next candidate
/// * `is_taken` - Whether a candidate already exists in storage
pub fn generate_unique<T, G, C>(
    kind: &str,
    max_attempts: u32,
    mut candidate: G,
    mut is_taken: C,
) -> Result<T, AccountError>
where
    G: FnMut() -> T,
    C: FnMut(&T) -> Result<bool, AccountError>,
{
    for _ in 0..max_attempts {
        let value = candidate();
        if !is_taken(&value)? {
            return Ok(value);
        }
    }

    warn!(kind, max_attempts, "Identifier generation exhausted");
    Err(AccountError::id_generation_exhausted(kind, max_attempts))
}

/// A transaction ID not yet present in `log`
pub fn next_transaction_id(
    log: &dyn TransactionLog,
    max_attempts: u32,
) -> Result<TransactionId, AccountError> {
    generate_unique("transaction id", max_attempts, TransactionId::generate, |id| {
        log.contains(id)
    })
}

/// A 10-digit account number not yet present in `ledger`
pub fn next_account_number(
    ledger: &dyn BalanceLedger,
    max_attempts: u32,
) -> Result<AccountNumber, AccountError> {
    let mut rng = rand::thread_rng();
    generate_unique(
        "account number",
        max_attempts,
        || {
            rng.gen_range(ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX)
                .to_string()
        },
        |number| Ok(ledger.find_account_by_number(number)?.is_some()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InMemoryLedger;
    use crate::types::ErrorCode;

    #[test]
    fn test_first_free_candidate_wins() {
        let mut next = 0;
        let value = generate_unique(
            "number",
            5,
            || {
                next += 1;
                next
            },
            |n| Ok(*n < 3),
        )
        .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_exhaustion_after_cap() {
        let mut draws = 0;
        let err = generate_unique(
            "number",
            4,
            || {
                draws += 1;
                draws
            },
            |_| Ok(true),
        )
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::IdGenerationExhausted);
        assert_eq!(draws, 4);
    }

    #[test]
    fn test_storage_error_propagates() {
        let err = generate_unique("number", 4, || 1, |_| Err(AccountError::internal("down")))
            .unwrap_err();
        assert_eq!(err, AccountError::internal("down"));
    }

    #[test]
    fn test_account_numbers_have_ten_digits() {
        let ledger = InMemoryLedger::new();
        let number = next_account_number(&ledger, 10).unwrap();
        assert_eq!(number.len(), 10);
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }
}
