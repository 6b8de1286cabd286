//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account and account-holder types
//! - `transaction`: Ledger record types and identifiers
//! - `error`: Error taxonomy for account and transaction operations
//! - `request`: Lock-protected operation requests
//! - `operation`: Replay inputs (seeded accounts, scripted operations)

pub mod account;
pub mod error;
pub mod operation;
pub mod request;
pub mod transaction;

pub use account::{Account, AccountNumber, AccountStatus, AccountUser, Amount, UserId};
pub use error::{AccountError, ErrorCode};
pub use operation::{AccountSeed, Operation};
pub use request::{CancelTransaction, CloseAccount, LockKey, UseTransaction};
pub use transaction::{TransactionId, TransactionRecord, TransactionResult, TransactionType};
