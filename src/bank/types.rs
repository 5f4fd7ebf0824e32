//! Types and limits used throughout the ledger.

/// Account identifier, persisted as a 32-bit signed integer.
pub type AccountId = i32;

/// Money type, a single floating-point amount.
pub type Money = f64;

/// Maximum number of accounts a ledger can hold.
pub const MAX_ACCOUNTS: usize = 100;

/// Width of the persisted name field, in bytes.
/// Stored names keep one byte for the NUL terminator.
pub const MAX_NAME_LENGTH: usize = 50;

/// Lowest balance a withdrawal may leave on a savings account.
pub const MINIMUM_BALANCE: Money = 500.0;

/// How far below zero a withdrawal may take a checking account.
pub const OVERDRAFT_LIMIT: Money = 1000.0;

/// Interest rate applied to savings accounts on accrual.
pub const INTEREST_RATE: Money = 0.05;

/// Identifier handed to the first account of a fresh ledger.
pub const FIRST_ACCOUNT_ID: AccountId = 1001;

/// Rule applied to the initial deposit of a new account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpeningPolicy {
    /// Any finite initial deposit is accepted, including negative ones.
    #[default]
    Unchecked,
    /// The initial deposit must be non-negative and satisfy the account type's floor.
    Enforced,
}
