//! Onboarding Admin CLI
//!
//! Read-only tooling for operators reconciling registrations: ledger lookups
//! and reconciliation journal verification.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use hats_onboarding::config::AppConfig;
use hats_onboarding::database::Database;
use hats_onboarding::ledger::{verify_journal, ReconciliationJournal, RegistrationLedger, SqliteLedger};
use hats_onboarding::validation::normalize_email;

#[derive(Parser)]
#[command(name = "onboarding-admin")]
#[command(about = "Inspect the registration ledger and reconciliation journal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ledger entry for an email
    Lookup {
        #[arg(short, long)]
        email: String,
    },
    /// List the most recent ledger entries
    List {
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
    /// Verify the reconciliation journal hash chain and print its incidents
    VerifyJournal {
        /// Defaults to the configured journal path
        #[arg(short, long)]
        path: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Lookup { email } => {
            let ledger = open_ledger(&config).await?;
            match ledger.lookup(&normalize_email(&email)).await? {
                Some(entry) => println!(
                    "{} -> {} (recorded {})",
                    entry.email, entry.address, entry.recorded_at
                ),
                None => println!("No registration for {}", email),
            }
        }
        Commands::List { limit } => {
            let ledger = open_ledger(&config).await?;
            let entries = ledger.list(limit).await?;
            if entries.is_empty() {
                println!("Ledger is empty");
            }
            for entry in entries {
                println!("{}\t{}\t{}", entry.recorded_at, entry.email, entry.address);
            }
        }
        Commands::VerifyJournal { path } => {
            let path = path.unwrap_or_else(|| config.journal.path.clone());
            let summary =
                verify_journal(&path).map_err(|e| anyhow!("Journal verification failed: {}", e))?;
            println!(
                "Journal OK: {} entries, head {}",
                summary.entries, summary.head_hash
            );

            let journal = ReconciliationJournal::open(&path)?;
            for entry in journal.entries()? {
                let i = &entry.incident;
                println!(
                    "#{} {} {} {} -> {} credential_tx={} admission_tx={} ({})",
                    entry.sequence,
                    entry.timestamp,
                    i.outcome,
                    i.email,
                    i.address,
                    i.credential_tx.as_deref().unwrap_or("-"),
                    i.admission_tx.as_deref().unwrap_or("-"),
                    i.detail
                );
            }
        }
    }

    Ok(())
}

async fn open_ledger(config: &AppConfig) -> Result<SqliteLedger> {
    let database = Database::new(&config.database_url).await?;
    database.run_migrations().await?;
    Ok(SqliteLedger::new(database.pool().clone()))
}
