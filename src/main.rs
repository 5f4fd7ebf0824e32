use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use csv::{ReaderBuilder, Trim};
use tokio::sync::mpsc;

use bank_ledger::{
    bank::{self, AccountId, AccountType, Money, OpeningPolicy, Session, SessionConfig},
    telemetry,
};

/// The size of the channel for processing batch operations.
const CHANNEL_SIZE: usize = 100;

/// Bank account ledger
#[derive(Parser)]
#[command(name = "bank-ledger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ledger file path
    #[arg(long, default_value = "bank.dat", global = true)]
    data: PathBuf,

    /// Only write the ledger file when the command finishes
    #[arg(long, global = true)]
    no_autosave: bool,

    /// Apply balance floors to initial deposits
    #[arg(long, global = true)]
    enforce_opening_balance: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new account
    Create {
        name: String,
        #[arg(allow_negative_numbers = true)]
        deposit: Money,
        #[arg(long, default_value = "savings")]
        kind: KindArg,
    },
    /// Deposit into an account
    Deposit {
        account: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Money,
    },
    /// Withdraw from an account
    Withdraw {
        account: AccountId,
        #[arg(allow_negative_numbers = true)]
        amount: Money,
    },
    /// Delete an account
    Delete { account: AccountId },
    /// Show one account
    Show { account: AccountId },
    /// Print all accounts as CSV
    List,
    /// Credit interest to every savings account
    Interest,
    /// Apply operations from a CSV file, then print all accounts
    Batch { input: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Savings,
    Checking,
}

impl From<KindArg> for AccountType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Savings => AccountType::Savings,
            KindArg::Checking => AccountType::Checking,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    let config = SessionConfig {
        path: cli.data,
        autosave: !cli.no_autosave,
        opening_policy: if cli.enforce_opening_balance {
            OpeningPolicy::Enforced
        } else {
            OpeningPolicy::Unchecked
        },
    };
    let mut session = Session::open(config).context("Failed to open ledger")?;

    match cli.command {
        Commands::Create {
            name,
            deposit,
            kind,
        } => {
            let id = session.create_account(&name, deposit, kind.into())?;
            println!("Account created successfully. Account Number: {id}");
        }
        Commands::Deposit { account, amount } => {
            let balance = session.deposit(account, amount)?;
            println!("Deposit successful. New balance: ${balance:.2}");
        }
        Commands::Withdraw { account, amount } => {
            let balance = session.withdraw(account, amount)?;
            println!("Withdrawal successful. New balance: ${balance:.2}");
        }
        Commands::Delete { account } => {
            session.delete_account(account)?;
            println!("Account deleted successfully.");
        }
        Commands::Show { account } => {
            println!("{}", session.find_account(account)?);
        }
        Commands::List => print_accounts(&session)?,
        Commands::Interest => {
            for adjustment in session.accrue_interest() {
                println!(
                    "Account {}: interest ${:.2}",
                    adjustment.account, adjustment.interest
                );
            }
        }
        Commands::Batch { input } => {
            session = run_batch(session, &input).await?;
            print_accounts(&session)?;
        }
    }

    session.close().context("Failed to save ledger")?;
    Ok(())
}

async fn run_batch(session: Session, input: &Path) -> Result<Session> {
    let (sender, receiver) = mpsc::channel(CHANNEL_SIZE);
    let mut state = bank::State::new(session, receiver);

    let handle = tokio::spawn(async move {
        state.run().await;
        state
    });

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    for operation in reader.deserialize::<bank::Operation>() {
        match operation {
            Ok(operation) => {
                if let Err(err) = sender.send(operation).await {
                    tracing::error!(%err, "service loop stopped");
                    break;
                }
            }
            Err(err) => tracing::warn!(%err, "skipping unreadable operation"),
        }
    }

    drop(sender); // Close the sender so the service loop finishes
    let state = handle.await.context("Failed to join the service loop")?;
    if state.rejected() > 0 {
        tracing::warn!(rejected = state.rejected(), "some operations were rejected");
    }
    Ok(state.into_session())
}

fn print_accounts(session: &Session) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for account in session.list_accounts() {
        writer.serialize(account)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_negative_amounts_parse() {
        let deposit = parse(&["bank-ledger", "deposit", "1001", "-5"]);
        assert!(matches!(
            deposit,
            Commands::Deposit { account: 1001, amount } if amount == -5.0
        ));

        let withdraw = parse(&["bank-ledger", "withdraw", "1001", "-0.5"]);
        assert!(matches!(
            withdraw,
            Commands::Withdraw { account: 1001, amount } if amount == -0.5
        ));

        let create = parse(&["bank-ledger", "create", "Bob", "-20", "--kind", "checking"]);
        assert!(matches!(
            create,
            Commands::Create { deposit, kind: KindArg::Checking, .. } if deposit == -20.0
        ));
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["bank-ledger", "list", "--data", "x.dat", "--no-autosave"])
            .unwrap();
        assert_eq!(cli.data, PathBuf::from("x.dat"));
        assert!(cli.no_autosave);
        assert!(!cli.enforce_opening_balance);
    }
}
