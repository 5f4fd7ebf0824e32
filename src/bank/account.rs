//! Accounts and the balance rules applied to them.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::types::{
    AccountId, INTEREST_RATE, MAX_NAME_LENGTH, MINIMUM_BALANCE, Money, OVERDRAFT_LIMIT,
};

/// Rounds to cents for presentation. The stored balance is never rounded.
fn serialize_money<S>(money: &Money, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    ((*money * 100.0).round() / 100.0).serialize(serializer)
}

/// The kind of an account, fixed at creation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Checking,
}

impl AccountType {
    /// Single-byte discriminant used in the persisted record.
    pub fn code(self) -> u8 {
        match self {
            AccountType::Savings => b'S',
            AccountType::Checking => b'C',
        }
    }

    /// Parses a persisted discriminant, `None` if unknown.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'S' => Some(AccountType::Savings),
            b'C' => Some(AccountType::Checking),
            _ => None,
        }
    }

    /// Lowest balance a withdrawal may leave behind.
    pub fn floor(self) -> Money {
        match self {
            AccountType::Savings => MINIMUM_BALANCE,
            AccountType::Checking => -OVERDRAFT_LIMIT,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => write!(f, "Savings"),
            AccountType::Checking => write!(f, "Checking"),
        }
    }
}

/// Cuts `name` so it fits the persisted field with its terminator,
/// never splitting a UTF-8 character. An embedded NUL ends the name.
pub(crate) fn truncate_name(name: &str) -> String {
    let name = name.split('\0').next().unwrap_or_default();
    let limit = MAX_NAME_LENGTH - 1;
    if name.len() <= limit {
        return name.to_string();
    }
    let mut end = limit;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Checks that `amount` is a finite, strictly positive value.
pub(crate) fn validate_amount(amount: Money) -> Result<Money, LedgerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

/// A single customer account.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Account {
    /// The unique identifier of the account.
    #[serde(rename = "account")]
    id: AccountId,

    /// The display name of the account holder.
    name: String,

    /// The current balance.
    #[serde(serialize_with = "serialize_money")]
    balance: Money,

    /// Savings or checking.
    #[serde(rename = "type")]
    kind: AccountType,
}

impl Account {
    /// Creates an account, truncating the name to the persisted width.
    pub(crate) fn new(id: AccountId, name: &str, balance: Money, kind: AccountType) -> Self {
        Account {
            id,
            name: truncate_name(name),
            balance,
            kind,
        }
    }

    /// Gets the account identifier.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Gets the holder name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the current balance.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Gets the account type.
    pub fn kind(&self) -> AccountType {
        self.kind
    }

    /// Deposits the specified amount and returns the new balance.
    pub(crate) fn deposit(&mut self, amount: Money) -> Result<Money, LedgerError> {
        let amount = validate_amount(amount)?;
        self.balance += amount;
        Ok(self.balance)
    }

    /// Withdraws the specified amount and returns the new balance.
    /// Returns an error if the account type's floor would be crossed.
    pub(crate) fn withdraw(&mut self, amount: Money) -> Result<Money, LedgerError> {
        let amount = validate_amount(amount)?;
        let floor = self.kind.floor();
        if self.balance - amount < floor {
            return Err(LedgerError::BalanceFloorViolation {
                account: self.id,
                kind: self.kind,
                balance: self.balance,
                amount,
                floor,
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Credits interest on savings accounts and returns the amount credited.
    /// Checking accounts are left untouched.
    pub(crate) fn accrue_interest(&mut self) -> Option<Money> {
        match self.kind {
            AccountType::Savings => {
                let interest = self.balance * INTEREST_RATE;
                self.balance += interest;
                Some(interest)
            }
            AccountType::Checking => None,
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account Type: {}", self.kind)?;
        writeln!(f, "Account Number: {}", self.id)?;
        writeln!(f, "Name: {}", self.name)?;
        write!(f, "Balance: ${:.2}", self.balance)
    }
}

/// Errors raised by ledger operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Maximum number of accounts reached")]
    CapacityExceeded,
    #[error("Account {0} not found")]
    NotFound(AccountId),
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),
    #[error(
        "{kind} account {account} cannot go from {balance:.2} by {amount:.2}: floor is {floor:.2}"
    )]
    BalanceFloorViolation {
        account: AccountId,
        kind: AccountType,
        balance: Money,
        amount: Money,
        floor: Money,
    },
}
