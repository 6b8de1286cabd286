//! CSV format handling for replay input and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `AccountCsvRecord` / `OperationCsvRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Account and ledger output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    Account, AccountSeed, AccountStatus, Amount, Operation, TransactionRecord, UserId,
};
use csv::Writer;
use serde::Deserialize;
use std::io::Write;

/// Header of the account output
pub const ACCOUNT_HEADER: [&str; 4] = ["account", "user", "balance", "status"];

/// Header of the ledger output
pub const LEDGER_HEADER: [&str; 7] = [
    "transaction_id",
    "account",
    "type",
    "result",
    "amount",
    "cancels",
    "transacted_at",
];

/// Seeded account row: `user,account,balance,status`
///
/// `status` may be left empty, which means `open`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub user: UserId,
    pub account: String,
    pub balance: Amount,
    pub status: Option<String>,
}

/// Operation row: `op,user,account,ref,amount`
///
/// Which columns are required depends on `op`:
///
/// | op        | user | account | ref      | amount |
/// |-----------|------|---------|----------|--------|
/// | `use`     | yes  | yes     | optional | yes    |
/// | `cancel`  |      | yes     | yes      | yes    |
/// | `close`   | yes  | yes     |          |        |
/// | `inquiry` |      |         | yes      |        |
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    pub op: String,
    pub user: Option<UserId>,
    pub account: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub amount: Option<String>,
}

/// Convert an AccountCsvRecord to an AccountSeed
///
/// # Returns
///
/// * `Ok(AccountSeed)` - Successfully converted record
/// * `Err(String)` - Empty account number, negative balance, or unknown status
pub fn convert_account_record(record: AccountCsvRecord) -> Result<AccountSeed, String> {
    if record.account.is_empty() {
        return Err(format!("Missing account number for user {}", record.user));
    }
    if record.balance < 0 {
        return Err(format!(
            "Negative balance {} for account {}",
            record.balance, record.account
        ));
    }

    let status = match record.status.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("") | Some("open") => AccountStatus::Open,
        Some("closed") => AccountStatus::Closed,
        Some(other) => {
            return Err(format!(
                "Invalid account status '{}' for account {}",
                other, record.account
            ))
        }
    };

    Ok(AccountSeed {
        user: record.user,
        account_number: record.account,
        balance: record.balance,
        status,
    })
}

/// Convert an OperationCsvRecord to an Operation
///
/// The operation name is case insensitive. Empty text columns count as absent.
///
/// # Returns
///
/// * `Ok(Operation)` - Successfully converted record
/// * `Err(String)` - Unknown operation, missing column, unparsable or negative amount
pub fn convert_operation_record(record: OperationCsvRecord) -> Result<Operation, String> {
    let op = record.op.to_lowercase();
    let account = non_empty(record.account);
    let reference = non_empty(record.reference);
    let amount = match non_empty(record.amount) {
        Some(raw) => Some(
            raw.trim()
                .parse::<Amount>()
                .map_err(|_| format!("Invalid amount '{}' for {}", raw, op))?,
        ),
        None => None,
    };
    if let Some(amount) = amount.filter(|amount| *amount < 0) {
        return Err(format!("Negative amount {} for {}", amount, op));
    }

    let missing = |column: &str| format!("{} requires the '{}' column", op, column);

    match op.as_str() {
        "use" => Ok(Operation::Use {
            user: record.user.ok_or_else(|| missing("user"))?,
            account_number: account.ok_or_else(|| missing("account"))?,
            label: reference,
            amount: amount.ok_or_else(|| missing("amount"))?,
        }),
        "cancel" => Ok(Operation::Cancel {
            reference: reference.ok_or_else(|| missing("ref"))?,
            account_number: account.ok_or_else(|| missing("account"))?,
            amount: amount.ok_or_else(|| missing("amount"))?,
        }),
        "close" => Ok(Operation::Close {
            user: record.user.ok_or_else(|| missing("user"))?,
            account_number: account.ok_or_else(|| missing("account"))?,
        }),
        "inquiry" => Ok(Operation::Inquiry {
            reference: reference.ok_or_else(|| missing("ref"))?,
        }),
        _ => Err(format!("Invalid operation: '{}'", record.op)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Write account states to CSV format
///
/// Writes accounts with columns: account, user, balance, status.
/// Accounts are sorted by account number for deterministic output.
///
/// # Arguments
///
/// * `accounts` - Slice of account states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(ACCOUNT_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts: Vec<&Account> = accounts.iter().collect();
    sorted_accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));

    for account in sorted_accounts {
        writer
            .write_record(&[
                account.account_number.clone(),
                account.owner.to_string(),
                account.balance.to_string(),
                account.status.as_str().to_string(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write transaction records to CSV format, in the order given
///
/// Timestamps are RFC 3339. `cancels` is empty unless the record is a
/// successful cancel.
pub fn write_ledger_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(LEDGER_HEADER)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for record in records {
        writer
            .write_record(&[
                record.transaction_id.to_string(),
                record.account_number.clone(),
                record.transaction_type.as_str().to_string(),
                record.result.as_str().to_string(),
                record.amount.to_string(),
                record
                    .cancels
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                record.transacted_at.to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write ledger record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
