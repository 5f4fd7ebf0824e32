//! Binary record format for a whole ledger.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! i32 account_count | i32 next_id | account_count * record
//! record = i32 id | [u8; 50] name (NUL padded) | f64 balance | u8 type ('S' or 'C')
//! ```
//!
//! Records are written in ascending identifier order.
use std::collections::HashSet;
use std::io::{Read, Write};

use thiserror::Error;

use crate::bank::{
    Account, AccountType, Ledger,
    types::{AccountId, MAX_ACCOUNTS, MAX_NAME_LENGTH},
};

const HEADER_SIZE: usize = 8;
const RECORD_SIZE: usize = 4 + MAX_NAME_LENGTH + 8 + 1;

/// Errors produced while reading or writing a ledger record.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed ledger record: {0}")]
    Malformed(String),
}

fn malformed(reason: impl Into<String>) -> CodecError {
    CodecError::Malformed(reason.into())
}

/// Encodes the ledger into its persisted byte form.
pub fn encode(ledger: &Ledger) -> Vec<u8> {
    let mut accounts: Vec<&Account> = ledger.accounts().collect();
    accounts.sort_by_key(|account| account.id());

    let mut bytes = Vec::with_capacity(HEADER_SIZE + accounts.len() * RECORD_SIZE);
    // The ledger never holds more than MAX_ACCOUNTS, which fits an i32.
    bytes.extend_from_slice(&(accounts.len() as i32).to_le_bytes());
    bytes.extend_from_slice(&ledger.next_id().to_le_bytes());
    for account in accounts {
        encode_account(account, &mut bytes);
    }
    bytes
}

fn encode_account(account: &Account, bytes: &mut Vec<u8>) {
    bytes.extend_from_slice(&account.id().to_le_bytes());
    let mut name = [0u8; MAX_NAME_LENGTH];
    let raw = account.name().as_bytes();
    let len = raw.len().min(MAX_NAME_LENGTH - 1);
    name[..len].copy_from_slice(&raw[..len]);
    bytes.extend_from_slice(&name);
    bytes.extend_from_slice(&account.balance().to_le_bytes());
    bytes.push(account.kind().code());
}

/// Decodes a complete persisted record.
///
/// The input must contain exactly the number of account records announced
/// by the header; anything else is rejected rather than partially loaded.
pub fn decode(bytes: &[u8]) -> Result<Ledger, CodecError> {
    if bytes.len() < HEADER_SIZE {
        return Err(malformed(format!(
            "header needs {HEADER_SIZE} bytes, found {}",
            bytes.len()
        )));
    }
    let count = read_i32(bytes, 0);
    let next_id = read_i32(bytes, 4);
    if next_id <= 0 {
        return Err(malformed(format!("bad next identifier {next_id}")));
    }

    let count = usize::try_from(count)
        .ok()
        .filter(|count| *count <= MAX_ACCOUNTS)
        .ok_or_else(|| malformed(format!("account count {count} out of range")))?;
    let expected = HEADER_SIZE + count * RECORD_SIZE;
    if bytes.len() != expected {
        return Err(malformed(format!(
            "{count} accounts need {expected} bytes, found {}",
            bytes.len()
        )));
    }

    let mut seen = HashSet::with_capacity(count);
    let mut accounts = Vec::with_capacity(count);
    for record in bytes[HEADER_SIZE..].chunks_exact(RECORD_SIZE) {
        let account = decode_account(record)?;
        if !seen.insert(account.id()) {
            return Err(malformed(format!("duplicate account {}", account.id())));
        }
        if account.id() >= next_id {
            return Err(malformed(format!(
                "account {} is not below next identifier {next_id}",
                account.id()
            )));
        }
        accounts.push(account);
    }
    Ok(Ledger::from_parts(accounts, next_id))
}

fn decode_account(record: &[u8]) -> Result<Account, CodecError> {
    let id: AccountId = read_i32(record, 0);
    if id <= 0 {
        return Err(malformed(format!("non-positive account identifier {id}")));
    }

    let name_field = &record[4..4 + MAX_NAME_LENGTH];
    let name_len = name_field
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(MAX_NAME_LENGTH);
    let Ok(name) = std::str::from_utf8(&name_field[..name_len]) else {
        return Err(malformed(format!("account {id} name is not UTF-8")));
    };

    let offset = 4 + MAX_NAME_LENGTH;
    let mut balance = [0u8; 8];
    balance.copy_from_slice(&record[offset..offset + 8]);
    let balance = f64::from_le_bytes(balance);

    let code = record[offset + 8];
    let Some(kind) = AccountType::from_code(code) else {
        return Err(malformed(format!("account {id} has type {code:#04x}")));
    };

    Ok(Account::new(id, name, balance, kind))
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

/// Writes the encoded ledger to `writer`.
pub fn write_to<W: Write>(ledger: &Ledger, mut writer: W) -> Result<(), CodecError> {
    writer.write_all(&encode(ledger))?;
    writer.flush()?;
    Ok(())
}

/// Reads `reader` to the end and decodes it.
pub fn read_from<R: Read>(mut reader: R) -> Result<Ledger, CodecError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}
