//! A ledger bound to its storage: the surface callers work against.
use std::path::PathBuf;

use tracing::{info, warn};

use crate::bank::{
    Account, AccountType, InterestAdjustment, Ledger, LedgerError, PersistenceError, Storage,
    types::{AccountId, Money, OpeningPolicy},
};

/// Settings for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Location of the ledger file.
    pub path: PathBuf,
    /// Flush to storage after every successful mutation.
    pub autosave: bool,
    pub opening_policy: OpeningPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            path: PathBuf::from("bank.dat"),
            autosave: true,
            opening_policy: OpeningPolicy::default(),
        }
    }
}

/// Owns the ledger for the lifetime of a process run.
#[derive(Debug)]
pub struct Session {
    ledger: Ledger,
    storage: Storage,
    autosave: bool,
    opening_policy: OpeningPolicy,
    /// Mutations not yet written to storage.
    dirty: bool,
}

impl Session {
    /// Opens the ledger file named by `config`, starting empty if it does not exist.
    pub fn open(config: SessionConfig) -> Result<Self, PersistenceError> {
        let mut session = Session {
            ledger: Ledger::with_policy(config.opening_policy),
            storage: Storage::new(config.path),
            autosave: config.autosave,
            opening_policy: config.opening_policy,
            dirty: false,
        };
        session.load()?;
        Ok(session)
    }

    /// Gets the ledger held by the session.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Whether there are mutations not yet written to storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the in-memory ledger with the persisted one.
    /// On failure the current ledger is kept.
    pub fn load(&mut self) -> Result<(), PersistenceError> {
        let mut ledger = self
            .storage
            .load()?
            .unwrap_or_else(|| Ledger::with_policy(self.opening_policy));
        ledger.set_opening_policy(self.opening_policy);
        self.ledger = ledger;
        self.dirty = false;
        Ok(())
    }

    /// Writes the ledger to storage.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        self.storage.save(&self.ledger)?;
        self.dirty = false;
        Ok(())
    }

    /// Final flush; only touches storage when there is something to write.
    pub fn close(mut self) -> Result<(), PersistenceError> {
        if self.dirty {
            self.save()?;
        }
        info!(path = %self.storage.path().display(), "session closed");
        Ok(())
    }

    /// Records a mutation and flushes it when autosave is on.
    /// A failed flush is logged and leaves the session dirty.
    fn mutated(&mut self) {
        self.dirty = true;
        if self.autosave {
            if let Err(error) = self.save() {
                warn!(%error, "autosave failed");
            }
        }
    }

    /// Opens a new account and returns its identifier.
    pub fn create_account(
        &mut self,
        name: &str,
        initial_deposit: Money,
        kind: AccountType,
    ) -> Result<AccountId, LedgerError> {
        let id = self.ledger.create(name, initial_deposit, kind)?;
        self.mutated();
        Ok(id)
    }

    /// Removes an account and hands it back.
    pub fn delete_account(&mut self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.ledger.delete(id)?;
        self.mutated();
        Ok(account)
    }

    /// Looks up an account by identifier.
    pub fn find_account(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.ledger.find(id)
    }

    /// Deposits into an account and returns the new balance.
    pub fn deposit(&mut self, id: AccountId, amount: Money) -> Result<Money, LedgerError> {
        let balance = self.ledger.deposit(id, amount)?;
        self.mutated();
        Ok(balance)
    }

    /// Withdraws from an account and returns the new balance.
    pub fn withdraw(&mut self, id: AccountId, amount: Money) -> Result<Money, LedgerError> {
        let balance = self.ledger.withdraw(id, amount)?;
        self.mutated();
        Ok(balance)
    }

    /// All accounts, sorted by identifier for presentation.
    pub fn list_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<_> = self.ledger.accounts().collect();
        accounts.sort_by_key(|account| account.id());
        accounts
    }

    /// Credits interest to every savings account.
    pub fn accrue_interest(&mut self) -> Vec<InterestAdjustment> {
        let adjustments = self.ledger.accrue_interest();
        if !adjustments.is_empty() {
            self.mutated();
        }
        adjustments
    }
}
