//! Registration Ledger
//!
//! Append-only record of verified email -> address bindings, plus the
//! reconciliation journal for registrations that stopped part way.

pub mod journal;
pub mod sqlite;

use async_trait::async_trait;

use crate::database::models::RegistrationLedgerEntry;
use crate::error::Result;

pub use journal::{verify_journal, IncidentRecord, JournalEntry, JournalSummary, ReconciliationJournal};
pub use sqlite::SqliteLedger;

/// Result of a ledger write that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Recorded,
    /// The email already has a binding; not retryable.
    AlreadyRegistered,
}

#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    /// Append a binding. There is no update or delete path.
    async fn record(&self, email: &str, address: &str) -> Result<LedgerWrite>;

    async fn lookup(&self, email: &str) -> Result<Option<RegistrationLedgerEntry>>;

    async fn list(&self, limit: i64) -> Result<Vec<RegistrationLedgerEntry>>;
}
