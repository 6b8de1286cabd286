//! Thread-safe in-memory balance ledger
//!
//! This module provides the `InMemoryLedger` struct, which stores account
//! holders and accounts using concurrent data structures.
//!
//! # Design
//!
//! `InMemoryLedger` uses `DashMap` (a concurrent HashMap) for both users and
//! accounts. The ledger does not serialize business operations itself: callers
//! mutate an account only while holding that account's lock from
//! [`crate::core::KeyedLockManager`], and the ledger just guarantees that each
//! individual read or write is atomic.

use crate::core::traits::BalanceLedger;
use crate::types::{Account, AccountError, AccountStatus, AccountUser, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe in-memory implementation of [`BalanceLedger`]
#[derive(Debug)]
pub struct InMemoryLedger {
    users: DashMap<UserId, AccountUser>,

    /// Accounts keyed by account number
    accounts: DashMap<String, Account>,

    next_id: AtomicU64,
}

impl InMemoryLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            accounts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a user (if new) and an account in one step
    ///
    /// Used to seed the ledger from fixtures and in tests. The user is created
    /// with an empty name if it does not exist yet.
    pub fn seed_account(
        &self,
        user_id: UserId,
        account_number: &str,
        balance: i64,
        status: AccountStatus,
    ) -> Account {
        self.users
            .entry(user_id)
            .or_insert_with(|| AccountUser::new(user_id, ""));

        let mut account = Account::open(self.next_account_id(), user_id, account_number, balance);
        if status == AccountStatus::Closed {
            account.close();
        }
        self.accounts
            .insert(account.account_number.clone(), account.clone());
        account
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn sorted(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
    accounts
}

impl BalanceLedger for InMemoryLedger {
    fn find_user_by_id(&self, user_id: UserId) -> Result<Option<AccountUser>, AccountError> {
        Ok(self.users.get(&user_id).map(|entry| entry.value().clone()))
    }

    fn save_user(&self, user: AccountUser) -> Result<AccountUser, AccountError> {
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, AccountError> {
        Ok(self
            .accounts
            .get(account_number)
            .map(|entry| entry.value().clone()))
    }

    fn save_account(&self, account: Account) -> Result<Account, AccountError> {
        self.accounts
            .insert(account.account_number.clone(), account.clone());
        Ok(account)
    }

    fn find_accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, AccountError> {
        Ok(sorted(
            self.accounts
                .iter()
                .filter(|entry| entry.value().owner == user_id)
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    fn count_open_accounts(&self, user_id: UserId) -> Result<usize, AccountError> {
        Ok(self
            .accounts
            .iter()
            .filter(|entry| {
                let account = entry.value();
                account.owner == user_id && account.status == AccountStatus::Open
            })
            .count())
    }

    fn all_accounts(&self) -> Result<Vec<Account>, AccountError> {
        Ok(sorted(
            self.accounts
                .iter()
                .map(|entry| entry.value().clone())
                .collect(),
        ))
    }

    fn next_account_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}
