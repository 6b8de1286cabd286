//! Engine configuration
//!
//! Each section has sensible defaults and a validating constructor that falls
//! back to the default (with a warning) when given an unusable value.

use crate::types::Amount;
use std::time::Duration;
use tracing::warn;

/// Transaction amount bounds, inclusive on both ends
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionConfig {
    pub min_amount: Amount,
    pub max_amount: Amount,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            min_amount: 10,
            max_amount: 1_000_000,
        }
    }
}

impl TransactionConfig {
    /// Create a TransactionConfig with custom bounds
    ///
    /// A negative minimum or a minimum above the maximum is rejected and both
    /// bounds revert to their defaults.
    pub fn new(min_amount: Amount, max_amount: Amount) -> Self {
        if min_amount < 0 || min_amount > max_amount {
            let default = Self::default();
            warn!(
                min_amount,
                max_amount,
                default_min = default.min_amount,
                default_max = default.max_amount,
                "Invalid transaction amount bounds, using defaults"
            );
            return default;
        }

        Self {
            min_amount,
            max_amount,
        }
    }

    pub fn contains(&self, amount: Amount) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }
}

/// Account lock timing
#[derive(Clone, Debug, PartialEq)]
pub struct LockConfig {
    /// Maximum time a caller waits for a contended account lock
    pub wait: Duration,

    /// Expected upper bound on how long a lock is held
    ///
    /// Advisory only: a holder is never evicted, but a critical section that
    /// outlives its lease is reported on release.
    pub lease: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(1),
            lease: Duration::from_secs(15),
        }
    }
}

impl LockConfig {
    pub fn new(wait: Duration, lease: Duration) -> Self {
        let default = Self::default();

        let lease = if lease.is_zero() {
            warn!(
                default_ms = default.lease.as_millis() as u64,
                "Invalid lock lease (0), using default"
            );
            default.lease
        } else {
            lease
        };

        Self { wait, lease }
    }
}

/// Account lifecycle limits
#[derive(Clone, Debug, PartialEq)]
pub struct AccountConfig {
    /// Maximum number of open accounts per user
    pub account_limit_per_user: usize,

    /// Cap on attempts to find an unused account number or transaction id
    pub id_generation_attempts: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            account_limit_per_user: 10,
            id_generation_attempts: 10,
        }
    }
}

impl AccountConfig {
    pub fn new(account_limit_per_user: usize, id_generation_attempts: u32) -> Self {
        let default = Self::default();

        let id_generation_attempts = if id_generation_attempts == 0 {
            warn!(
                default = default.id_generation_attempts,
                "Invalid id_generation_attempts (0), using default"
            );
            default.id_generation_attempts
        } else {
            id_generation_attempts
        };

        Self {
            account_limit_per_user,
            id_generation_attempts,
        }
    }
}

/// Complete engine configuration
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub transaction: TransactionConfig,
    pub lock: LockConfig,
    pub account: AccountConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::valid(100, 1000, 100, 1000)]
    #[case::single_value(500, 500, 500, 500)]
    #[case::negative_min(-1, 1000, 10, 1_000_000)]
    #[case::inverted(1000, 100, 10, 1_000_000)]
    fn test_transaction_config_new(
        #[case] min: Amount,
        #[case] max: Amount,
        #[case] expected_min: Amount,
        #[case] expected_max: Amount,
    ) {
        let config = TransactionConfig::new(min, max);
        assert_eq!(config.min_amount, expected_min);
        assert_eq!(config.max_amount, expected_max);
    }

    #[rstest]
    #[case(99, false)]
    #[case(100, true)]
    #[case(1000, true)]
    #[case(1001, false)]
    fn test_transaction_config_bounds_are_inclusive(#[case] amount: Amount, #[case] inside: bool) {
        let config = TransactionConfig::new(100, 1000);
        assert_eq!(config.contains(amount), inside);
    }

    #[test]
    fn test_lock_config_zero_lease_falls_back() {
        let config = LockConfig::new(Duration::from_millis(50), Duration::ZERO);
        assert_eq!(config.wait, Duration::from_millis(50));
        assert_eq!(config.lease, LockConfig::default().lease);
    }

    #[test]
    fn test_account_config_zero_attempts_falls_back() {
        let config = AccountConfig::new(3, 0);
        assert_eq!(config.account_limit_per_user, 3);
        assert_eq!(config.id_generation_attempts, 10);
    }
}
