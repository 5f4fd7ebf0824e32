//! Ledger operations fed to the service loop, e.g. from a CSV batch.
use serde::Deserialize;
use thiserror::Error;

use crate::bank::{
    AccountType, LedgerError, Session,
    types::{AccountId, Money},
};

/// Enum representing the type of operation.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Deposit,
    Withdraw,
    Delete,
    Interest,
}

/// A single request against the ledger.
///
/// Fields an operation does not use may be left empty.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Operation {
    #[serde(rename = "type")]
    op_type: OperationType,

    /// The target account, for everything except `create` and `interest`.
    account: Option<AccountId>,

    /// The holder name, for `create`.
    name: Option<String>,

    /// The amount moved, or the initial deposit for `create`.
    amount: Option<Money>,

    /// Savings or checking, for `create`.
    kind: Option<AccountType>,
}

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(AccountId),
    Balance(Money),
    Deleted(AccountId),
    InterestApplied(usize),
}

/// Errors that can occur while applying an operation.
#[derive(Error, Debug, PartialEq)]
pub enum OperationError {
    #[error("Operation {op_type:?} is missing field `{field}`")]
    MissingField {
        op_type: OperationType,
        field: &'static str,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl Operation {
    /// Gets the type of the operation.
    pub fn op_type(&self) -> OperationType {
        self.op_type
    }

    /// Gets a field the operation needs, or reports it missing.
    fn require<T: Clone>(
        &self,
        value: &Option<T>,
        field: &'static str,
    ) -> Result<T, OperationError> {
        value.clone().ok_or(OperationError::MissingField {
            op_type: self.op_type,
            field,
        })
    }

    /// Applies the operation to `session`.
    pub fn apply(&self, session: &mut Session) -> Result<Outcome, OperationError> {
        match self.op_type {
            OperationType::Create => {
                let name = self.require(&self.name, "name")?;
                let amount = self.require(&self.amount, "amount")?;
                let kind = self.require(&self.kind, "kind")?;
                let id = session.create_account(&name, amount, kind)?;
                Ok(Outcome::Created(id))
            }
            OperationType::Deposit => {
                let account = self.require(&self.account, "account")?;
                let amount = self.require(&self.amount, "amount")?;
                Ok(Outcome::Balance(session.deposit(account, amount)?))
            }
            OperationType::Withdraw => {
                let account = self.require(&self.account, "account")?;
                let amount = self.require(&self.amount, "amount")?;
                Ok(Outcome::Balance(session.withdraw(account, amount)?))
            }
            OperationType::Delete => {
                let account = self.require(&self.account, "account")?;
                let removed = session.delete_account(account)?;
                Ok(Outcome::Deleted(removed.id()))
            }
            OperationType::Interest => {
                let applied = session.accrue_interest().len();
                Ok(Outcome::InterestApplied(applied))
            }
        }
    }

    #[cfg(test)]
    pub fn new(
        op_type: OperationType,
        account: Option<AccountId>,
        name: Option<&str>,
        amount: Option<Money>,
        kind: Option<AccountType>,
    ) -> Self {
        Operation {
            op_type,
            account,
            name: name.map(str::to_string),
            amount,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::SessionConfig;

    fn session(dir: &tempfile::TempDir) -> Session {
        Session::open(SessionConfig {
            path: dir.path().join("bank.dat"),
            autosave: false,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_csv() {
        let data = "\
type,account,name,amount,kind
create,,Alice,1500,savings
deposit,1001,,200.5,
interest,,,,
";
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        let operations: Vec<Operation> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            operations,
            vec![
                Operation::new(
                    OperationType::Create,
                    None,
                    Some("Alice"),
                    Some(1500.0),
                    Some(AccountType::Savings)
                ),
                Operation::new(OperationType::Deposit, Some(1001), None, Some(200.5), None),
                Operation::new(OperationType::Interest, None, None, None, None),
            ]
        );
    }

    #[test]
    fn test_apply_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let create = Operation::new(
            OperationType::Create,
            None,
            Some("Alice"),
            Some(1000.0),
            Some(AccountType::Savings),
        );
        assert_eq!(create.apply(&mut session), Ok(Outcome::Created(1001)));

        let interest = Operation::new(OperationType::Interest, None, None, None, None);
        assert_eq!(
            interest.apply(&mut session),
            Ok(Outcome::InterestApplied(1))
        );

        let withdraw = Operation::new(OperationType::Withdraw, Some(1001), None, Some(550.0), None);
        assert_eq!(withdraw.apply(&mut session), Ok(Outcome::Balance(500.0)));

        let delete = Operation::new(OperationType::Delete, Some(1001), None, None, None);
        assert_eq!(delete.apply(&mut session), Ok(Outcome::Deleted(1001)));
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let deposit = Operation::new(OperationType::Deposit, None, None, Some(10.0), None);
        assert_eq!(
            deposit.apply(&mut session),
            Err(OperationError::MissingField {
                op_type: OperationType::Deposit,
                field: "account"
            })
        );
    }

    #[test]
    fn test_ledger_error_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let withdraw = Operation::new(OperationType::Withdraw, Some(7), None, Some(10.0), None);
        assert_eq!(
            withdraw.apply(&mut session),
            Err(OperationError::Ledger(LedgerError::NotFound(7)))
        );
    }
}
