//! The in-memory registry of accounts and the identifier allocator.
use std::collections::HashMap;

use tracing::debug;

use crate::bank::{
    Account, AccountType, LedgerError,
    account::validate_amount,
    types::{AccountId, FIRST_ACCOUNT_ID, MAX_ACCOUNTS, MINIMUM_BALANCE, Money, OpeningPolicy},
};

/// Interest credited to one account by [`Ledger::accrue_interest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestAdjustment {
    pub account: AccountId,
    pub interest: Money,
}

/// A bounded collection of accounts.
///
/// Accounts are keyed by identifier, so enumeration order is arbitrary and
/// may change after any mutation.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// A map of identifiers to their respective accounts.
    accounts: HashMap<AccountId, Account>,
    /// The identifier the next created account receives.
    next_id: AccountId,
    /// Rule applied to initial deposits.
    opening_policy: OpeningPolicy,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger::new()
    }
}

impl Ledger {
    /// Creates an empty ledger with the default opening policy.
    pub fn new() -> Self {
        Ledger::with_policy(OpeningPolicy::default())
    }

    /// Creates an empty ledger that applies `opening_policy` to new accounts.
    pub fn with_policy(opening_policy: OpeningPolicy) -> Self {
        Ledger {
            accounts: HashMap::new(),
            next_id: FIRST_ACCOUNT_ID,
            opening_policy,
        }
    }

    /// Rebuilds a ledger from persisted parts. The caller has already
    /// checked that identifiers are unique and below `next_id`.
    pub(crate) fn from_parts(accounts: Vec<Account>, next_id: AccountId) -> Self {
        Ledger {
            accounts: accounts
                .into_iter()
                .map(|account| (account.id(), account))
                .collect(),
            next_id,
            opening_policy: OpeningPolicy::default(),
        }
    }

    /// Gets the rule applied to initial deposits.
    pub fn opening_policy(&self) -> OpeningPolicy {
        self.opening_policy
    }

    /// Changes the rule applied to initial deposits from now on.
    pub fn set_opening_policy(&mut self, policy: OpeningPolicy) {
        self.opening_policy = policy;
    }

    /// The identifier the next created account will receive.
    pub fn next_id(&self) -> AccountId {
        self.next_id
    }

    /// Number of accounts held.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the ledger holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Opens a new account and returns its identifier.
    pub fn create(
        &mut self,
        name: &str,
        initial_deposit: Money,
        kind: AccountType,
    ) -> Result<AccountId, LedgerError> {
        if self.accounts.len() >= MAX_ACCOUNTS {
            return Err(LedgerError::CapacityExceeded);
        }
        self.check_opening_balance(initial_deposit, kind)?;

        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(LedgerError::CapacityExceeded)?;
        self.accounts.insert(id, Account::new(id, name, initial_deposit, kind));
        debug!(account = id, %kind, balance = initial_deposit, "account created");
        Ok(id)
    }

    fn check_opening_balance(&self, amount: Money, kind: AccountType) -> Result<(), LedgerError> {
        if !amount.is_finite() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        match self.opening_policy {
            OpeningPolicy::Unchecked => Ok(()),
            OpeningPolicy::Enforced if amount < 0.0 => Err(LedgerError::InvalidAmount(amount)),
            OpeningPolicy::Enforced => match kind {
                AccountType::Savings if amount < MINIMUM_BALANCE => {
                    Err(LedgerError::BalanceFloorViolation {
                        account: self.next_id,
                        kind,
                        balance: 0.0,
                        amount,
                        floor: MINIMUM_BALANCE,
                    })
                }
                _ => Ok(()),
            },
        }
    }

    /// Removes an account and hands it back.
    pub fn delete(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.accounts.remove(&id).ok_or(LedgerError::NotFound(id))?;
        debug!(account = id, "account deleted");
        Ok(account)
    }

    /// Looks up an account by identifier.
    pub fn find(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts.get(&id).ok_or(LedgerError::NotFound(id))
    }

    fn find_mut(&mut self, id: AccountId) -> Result<&mut Account, LedgerError> {
        self.accounts.get_mut(&id).ok_or(LedgerError::NotFound(id))
    }

    /// Adds `amount` to an account and returns the new balance.
    pub fn deposit(&mut self, id: AccountId, amount: Money) -> Result<Money, LedgerError> {
        validate_amount(amount)?;
        let balance = self.find_mut(id)?.deposit(amount)?;
        debug!(account = id, amount, balance, "deposit");
        Ok(balance)
    }

    /// Takes `amount` from an account and returns the new balance.
    pub fn withdraw(&mut self, id: AccountId, amount: Money) -> Result<Money, LedgerError> {
        validate_amount(amount)?;
        let balance = self.find_mut(id)?.withdraw(amount)?;
        debug!(account = id, amount, balance, "withdrawal");
        Ok(balance)
    }

    /// Credits interest to every savings account.
    pub fn accrue_interest(&mut self) -> Vec<InterestAdjustment> {
        let adjustments: Vec<_> = self
            .accounts
            .values_mut()
            .filter_map(|account| {
                account.accrue_interest().map(|interest| InterestAdjustment {
                    account: account.id(),
                    interest,
                })
            })
            .collect();
        debug!(accounts = adjustments.len(), "interest accrued");
        adjustments
    }

    /// All accounts, in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }
}
