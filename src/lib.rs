//! Account Ledger Library
//! # Overview
//!
//! This library keeps account balances consistent under concurrent uses and
//! cancels. Every balance change runs while holding a per-account lock, and
//! every attempt (successful or not) leaves a record in an append-only log.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransactionRecord, AccountError, etc.)
//! - [`config`] - Amount bounds, lock timing, and account limits
//! - [`core`] - Business logic components:
//!   - [`core::lock_manager`] - Per-account mutual exclusion with bounded wait
//!   - [`core::engine`] - Use, cancel, and inquiry rules
//!   - [`core::service`] - Lock-protected entry point with failure auditing
//!   - [`core::account_service`] - Opening, closing, and listing accounts
//!   - [`core::ledger`] / [`core::transaction_log`] - In-memory storage
//! - [`io`] - CSV input and output
//! - [`strategy`] - Replay pipelines (sequential or partitioned by account)
//! - [`cli`] - CLI arguments parsing
//!
//! # Operations
//!
//! - **Use**: Debit an account on behalf of its owner
//! - **Cancel**: Reverse a successful use, crediting the same amount back
//! - **Inquiry**: Look up a transaction record
//! - **Close**: Close an account whose balance is zero
//!
//! A rejected use or cancel is recorded as a FAILED transaction after the
//! account lock has been released.
//!
//! # Example
//!
//! ```no_run
//! use account_ledger::config::EngineConfig;
//! use account_ledger::strategy::Replay;
//! use account_ledger::types::{AccountSeed, AccountStatus, UseTransaction};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let replay = Replay::new(&EngineConfig::default());
//! replay.seed(AccountSeed {
//!     user: 1,
//!     account_number: "1000000000".to_string(),
//!     balance: 10_000,
//!     status: AccountStatus::Open,
//! })?;
//!
//! let record = replay
//!     .transactions()
//!     .use_transaction(&UseTransaction::new(1, "1000000000", 200))
//!     .await?;
//! println!("used: {}", record.transaction_id);
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::EngineConfig;
pub use core::{
    AccountService, AuditRecorder, BalanceLedger, InMemoryLedger, InMemoryTransactionLog,
    KeyedLockManager, TransactionEngine, TransactionLog, TransactionService,
};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountError, ErrorCode, TransactionId, TransactionRecord, TransactionResult,
    TransactionType,
};
