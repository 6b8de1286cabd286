//! Core business logic module
//!
//! This module contains the account and transaction components:
//! - `traits` - Storage abstractions (`BalanceLedger`, `TransactionLog`)
//! - `ledger` / `transaction_log` - DashMap-backed in-memory storage
//! - `lock_manager` - Per-account mutual exclusion with bounded wait
//! - `engine` - Use, cancel, and inquiry rules (lock-free critical sections)
//! - `audit` - FAILED record appends for rejected operations
//! - `service` - Lock-protected entry point combining the above
//! - `account_service` - Opening, closing, and listing accounts
//! - `id_generator` - Bounded retry loop for unique identifiers

pub mod account_service;
pub mod audit;
pub mod engine;
pub mod id_generator;
pub mod ledger;
pub mod lock_manager;
pub mod service;
pub mod traits;
pub mod transaction_log;

#[cfg(test)]
mod testing;

pub use account_service::AccountService;
pub use audit::AuditRecorder;
pub use engine::TransactionEngine;
pub use ledger::InMemoryLedger;
pub use lock_manager::{AccountLock, KeyedLockManager, LockHolder};
pub use service::TransactionService;
pub use traits::{BalanceLedger, TransactionLog};
pub use transaction_log::InMemoryTransactionLog;
