//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Streaming CSV readers with an iterator interface

pub mod csv_format;
pub mod sync_reader;

pub use csv_format::{
    convert_account_record, convert_operation_record, write_accounts_csv, write_ledger_csv,
    AccountCsvRecord, OperationCsvRecord,
};
pub use sync_reader::{AccountReader, OperationReader, SyncReader};
