//! Synchronous CSV reader with iterator interface
//!
//! Provides streaming iterators over the two replay inputs: seeded accounts
//! and scripted operations. Delegates CSV format concerns to the csv_format
//! module.
//!
//! # Design
//!
//! `SyncReader` reads and deserializes one CSV row at a time with
//! `csv::Reader`, then hands the row to a conversion function from
//! `csv_format`. The same reader serves both inputs:
//!
//! ```no_run
//! use account_ledger::io::sync_reader::OperationReader;
//! use std::path::Path;
//!
//! let reader = OperationReader::operations(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Replaying: {:?}", operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from the constructors
//! - Individual row errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging

use crate::io::csv_format::{
    convert_account_record, convert_operation_record, AccountCsvRecord, OperationCsvRecord,
};
use crate::types::{AccountSeed, Operation};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;

/// Reader over the seeded accounts file
pub type AccountReader = SyncReader<AccountCsvRecord, AccountSeed>;

/// Reader over the operations file
pub type OperationReader = SyncReader<OperationCsvRecord, Operation>;

/// Synchronous CSV reader
///
/// Yields one converted item per CSV row, keeping memory usage constant in
/// the size of the file.
#[derive(Debug)]
pub struct SyncReader<R, T> {
    reader: csv::Reader<File>,
    convert: fn(R) -> Result<T, String>,
    line_num: usize,
}

impl AccountReader {
    /// Open a `user,account,balance,status` file
    pub fn accounts(path: &Path) -> Result<Self, String> {
        Self::new(path, convert_account_record)
    }
}

impl OperationReader {
    /// Open an `op,user,account,ref,amount` file
    pub fn operations(path: &Path) -> Result<Self, String> {
        Self::new(path, convert_operation_record)
    }
}

impl<R: DeserializeOwned, T> SyncReader<R, T> {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    /// * `convert` - Turns a deserialized row into a domain value
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if file opened successfully
    /// * `Err(String)` if file could not be opened
    pub fn new(path: &Path, convert: fn(R) -> Result<T, String>) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            convert,
            line_num: 0,
        })
    }
}

impl<R: DeserializeOwned, T> Iterator for SyncReader<R, T> {
    type Item = Result<T, String>;

    /// Get the next converted row
    ///
    /// # Returns
    ///
    /// * `Some(Ok(T))` - Successfully parsed row
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let next = self.reader.deserialize::<R>().next()?;
        self.line_num += 1;

        // +1 for the header row
        let line = self.line_num + 1;
        Some(match next {
            Ok(record) => (self.convert)(record).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
