//! Keyed mutual exclusion over account numbers
//!
//! This module provides the `KeyedLockManager`, which serializes critical
//! sections per key (an account number) while letting different keys proceed
//! in parallel.
//!
//! # Design
//!
//! ```text
//! KeyedLockManager
//!     └── Arc<LockTable>
//!         ├── slots:   DashMap<key, Arc<tokio::sync::Mutex<()>>>
//!         └── holders: DashMap<key, LockHolder>
//! ```
//!
//! Each key maps to its own async mutex. The table itself is a sharded
//! `DashMap`, so looking up the mutex for one key never contends with unrelated
//! keys and never depends on the per-key mutexes it hands out.
//!
//! Acquisition waits at most the configured budget and fails with
//! `AccountTransactionLocked` afterwards. The returned [`AccountLock`] releases
//! on drop, so every exit path of a critical section (early return, error,
//! panic unwinding) gives the key back. Slots are removed from the table once
//! nobody holds or waits for them.

use crate::config::LockConfig;
use crate::types::AccountError;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Who holds a key, and since when
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHolder {
    /// Unique per acquisition
    pub id: u64,
    pub acquired_at: Instant,
}

#[derive(Debug, Default)]
struct LockTable {
    slots: DashMap<String, Arc<Mutex<()>>>,
    holders: DashMap<String, LockHolder>,
    next_holder: AtomicU64,
}

impl LockTable {
    /// Drop the slot for `key` if the caller's reference and the table's are the only ones left
    fn remove_idle(&self, key: &str, slot: &Arc<Mutex<()>>) {
        self.slots.remove_if(key, |_, current| {
            Arc::ptr_eq(current, slot) && Arc::strong_count(current) == 2
        });
    }
}

/// Grants mutual exclusion over string keys with a bounded wait
///
/// Cloning is cheap and clones share the same lock table.
#[derive(Debug, Clone)]
pub struct KeyedLockManager {
    table: Arc<LockTable>,
    config: LockConfig,
}

impl KeyedLockManager {
    pub fn new(config: LockConfig) -> Self {
        Self {
            table: Arc::new(LockTable::default()),
            config,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire `key`, waiting at most the configured budget
    pub async fn acquire(&self, key: &str) -> Result<AccountLock, AccountError> {
        self.acquire_within(key, self.config.wait).await
    }

    /// Acquire `key`, waiting at most `wait`
    ///
    /// An uncontended key is granted even with a zero budget.
    ///
    /// # Returns
    ///
    /// * `Ok(AccountLock)` - The key is held until the lock is released or dropped
    /// * `Err(AccountError::AccountTransactionLocked)` - The budget ran out
    pub async fn acquire_within(
        &self,
        key: &str,
        wait: Duration,
    ) -> Result<AccountLock, AccountError> {
        let slot = self
            .table
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let guard = match tokio::time::timeout(wait, Arc::clone(&slot).lock_owned()).await {
            Ok(guard) => guard,
            Err(_) => {
                self.table.remove_idle(key, &slot);
                warn!(
                    key,
                    wait_ms = wait.as_millis() as u64,
                    "Timed out waiting for account lock"
                );
                return Err(AccountError::transaction_locked(key));
            }
        };

        let holder = LockHolder {
            id: self.table.next_holder.fetch_add(1, Ordering::Relaxed),
            acquired_at: Instant::now(),
        };
        self.table.holders.insert(key.to_string(), holder);
        debug!(key, holder = holder.id, "Account lock acquired");

        Ok(AccountLock {
            key: key.to_string(),
            holder,
            lease: self.config.lease,
            guard: Some(guard),
            table: Arc::clone(&self.table),
        })
    }

    /// Release a lock
    ///
    /// Equivalent to dropping it.
    pub fn release(&self, lock: AccountLock) {
        lock.release();
    }

    /// Run `critical_section` while holding `key`
    ///
    /// The lock is released whether the section returns `Ok`, returns `Err`,
    /// or panics. Errors from the section are returned unchanged.
    pub async fn run_locked<T, F, Fut>(
        &self,
        key: &str,
        critical_section: F,
    ) -> Result<T, AccountError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AccountError>>,
    {
        let lock = self.acquire(key).await?;
        let result = critical_section().await;
        lock.release();
        result
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.table.holders.contains_key(key)
    }

    /// Current holder of `key`, if any
    pub fn holder(&self, key: &str) -> Option<LockHolder> {
        self.table.holders.get(key).map(|entry| *entry.value())
    }

    /// Number of keys currently held or waited on
    pub fn tracked_keys(&self) -> usize {
        self.table.slots.len()
    }
}

impl Default for KeyedLockManager {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

/// A held account lock
///
/// Released exactly once: by [`AccountLock::release`] or on drop, whichever
/// comes first.
#[derive(Debug)]
#[must_use = "the key is released as soon as the lock is dropped"]
pub struct AccountLock {
    key: String,
    holder: LockHolder,
    lease: Duration,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockTable>,
}

impl AccountLock {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn holder(&self) -> LockHolder {
        self.holder
    }

    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let held_for = self.holder.acquired_at.elapsed();

        // Clear our holder entry before unlocking so the next holder's entry survives.
        let holder_id = self.holder.id;
        self.table
            .holders
            .remove_if(&self.key, |_, current| current.id == holder_id);

        let slot = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);
        self.table.remove_idle(&self.key, &slot);

        if held_for > self.lease {
            warn!(
                key = %self.key,
                holder = holder_id,
                held_ms = held_for.as_millis() as u64,
                lease_ms = self.lease.as_millis() as u64,
                "Account lock held past its lease"
            );
        } else {
            debug!(key = %self.key, holder = holder_id, "Account lock released");
        }
    }
}

impl Drop for AccountLock {
    fn drop(&mut self) {
        self.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;

    fn manager(wait: Duration) -> KeyedLockManager {
        KeyedLockManager::new(LockConfig::new(wait, Duration::from_secs(15)))
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let locks = manager(Duration::from_secs(1));

        let lock = locks.acquire("1000000000").await.unwrap();
        assert_eq!(lock.key(), "1000000000");
        assert!(locks.is_locked("1000000000"));
        assert_eq!(locks.holder("1000000000"), Some(lock.holder()));

        locks.release(lock);
        assert!(!locks.is_locked("1000000000"));
        assert_eq!(locks.tracked_keys(), 0);

        let again = locks.acquire_within("1000000000", Duration::ZERO).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = manager(Duration::from_secs(1));

        let _a = locks.acquire("1000000000").await.unwrap();
        let b = locks.acquire_within("2000000000", Duration::ZERO).await;

        assert!(b.is_ok());
        assert_eq!(locks.tracked_keys(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_times_out() {
        let locks = manager(Duration::from_millis(50));

        let _held = locks.acquire("1000000000").await.unwrap();
        let err = locks.acquire("1000000000").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::AccountTransactionLocked);
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_acquires_after_release() {
        let locks = manager(Duration::from_secs(1));
        let held = locks.acquire("1000000000").await.unwrap();
        let first_holder = held.holder().id;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire("1000000000").await.map(|l| l.holder().id) })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        held.release();

        let second_holder = waiter.await.unwrap().unwrap();
        assert_ne!(first_holder, second_holder);
    }

    #[tokio::test]
    async fn test_dropping_lock_releases_key() {
        let locks = manager(Duration::from_secs(1));
        {
            let _lock = locks.acquire("1000000000").await.unwrap();
        }
        assert!(!locks.is_locked("1000000000"));
        assert!(locks
            .acquire_within("1000000000", Duration::ZERO)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_run_locked_forwards_error_and_releases() {
        let locks = manager(Duration::from_secs(1));

        let result: Result<(), AccountError> = locks
            .run_locked("1000000000", || async {
                Err(AccountError::balance_not_enough("1000000000", 0, 100))
            })
            .await;

        assert_eq!(
            result.unwrap_err(),
            AccountError::balance_not_enough("1000000000", 0, 100)
        );
        assert!(!locks.is_locked("1000000000"));
    }

    #[tokio::test]
    async fn test_panic_in_critical_section_releases() {
        let locks = manager(Duration::from_secs(1));

        let task = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks
                    .run_locked("1000000000", || async {
                        if true {
                            panic!("fault inside critical section");
                        }
                        Ok(())
                    })
                    .await
            })
        };
        assert!(task.await.is_err());

        assert!(!locks.is_locked("1000000000"));
        assert!(locks
            .acquire_within("1000000000", Duration::ZERO)
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_sections_on_same_key_never_overlap() {
        let locks = manager(Duration::from_secs(10));

        let mut tasks = Vec::new();
        for i in 0..2u64 {
            let locks = locks.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100 * i)).await;
                locks
                    .run_locked("1000000000", || async {
                        let start = tokio::time::Instant::now();
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        Ok((start, tokio::time::Instant::now()))
                    })
                    .await
                    .unwrap()
            }));
        }

        let first = tasks.remove(0).await.unwrap();
        let second = tasks.remove(0).await.unwrap();
        assert!(second.0 >= first.1, "second section started before the first ended");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_waiter_leaves_no_slot_behind() {
        let locks = manager(Duration::from_millis(10));

        let held = locks.acquire("1000000000").await.unwrap();
        assert!(locks.acquire("1000000000").await.is_err());
        assert_eq!(locks.tracked_keys(), 1);

        drop(held);
        assert_eq!(locks.tracked_keys(), 0);
    }
}
