//! Reconciliation Journal
//!
//! Append-only JSONL file of registrations that stopped after an irreversible
//! step. Each line is SHA-256 chained to the previous one so edits and
//! deletions are detectable when operators reconcile by hand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{OnboardingError, Result};

pub const GENESIS_HASH: &str =
    "sha256:0000000000000000000000000000000000000000000000000000000000000000";

/// What went wrong, and everything needed to finish or undo it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub attempt_id: Uuid,
    pub outcome: String,
    pub email: String,
    pub address: String,
    pub credential_tx: Option<String>,
    pub admission_tx: Option<String>,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub incident: IncidentRecord,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl JournalEntry {
    fn new(sequence: u64, incident: IncidentRecord, previous_hash: String) -> Self {
        let mut entry = Self {
            sequence,
            timestamp: Utc::now(),
            incident,
            previous_hash,
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.calculate_hash();
        entry
    }

    pub fn canonical_string(&self) -> String {
        let i = &self.incident;
        format!(
            "sequence:{}|timestamp:{}|attempt_id:{}|outcome:{}|email:{}|address:{}|credential_tx:{}|admission_tx:{}|detail:{}|previous_hash:{}",
            self.sequence,
            self.timestamp.to_rfc3339(),
            i.attempt_id,
            i.outcome,
            i.email,
            i.address,
            i.credential_tx.as_deref().unwrap_or("-"),
            i.admission_tx.as_deref().unwrap_or("-"),
            i.detail,
            self.previous_hash
        )
    }

    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_string().as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    pub fn verify_hash(&self) -> bool {
        self.entry_hash == self.calculate_hash()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalSummary {
    pub entries: u64,
    pub head_hash: String,
}

struct JournalState {
    file: File,
    head_hash: String,
    count: u64,
}

pub struct ReconciliationJournal {
    path: PathBuf,
    state: Mutex<JournalState>,
}

impl ReconciliationJournal {
    /// Open (or create) the journal, verifying any existing chain first.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let summary = if path.exists() {
            verify_journal(&path)?
        } else {
            JournalSummary {
                entries: 0,
                head_hash: GENESIS_HASH.to_string(),
            }
        };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(
            "Opened reconciliation journal {:?} with {} entries",
            path, summary.entries
        );

        Ok(Self {
            path,
            state: Mutex::new(JournalState {
                file,
                head_hash: summary.head_hash,
                count: summary.entries,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, incident: IncidentRecord) -> Result<JournalEntry> {
        let mut state = self.state.lock().await;
        let entry = JournalEntry::new(state.count, incident, state.head_hash.clone());

        let json = serde_json::to_string(&entry)?;
        writeln!(state.file, "{}", json)?;
        state.file.flush()?;

        state.head_hash = entry.entry_hash.clone();
        state.count += 1;

        debug!(sequence = entry.sequence, outcome = %entry.incident.outcome, "Journaled incident");
        Ok(entry)
    }

    pub async fn head_hash(&self) -> String {
        self.state.lock().await.head_hash.clone()
    }

    pub async fn entry_count(&self) -> u64 {
        self.state.lock().await.count
    }

    pub fn entries(&self) -> Result<Vec<JournalEntry>> {
        read_entries(&self.path)
    }
}

fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let file = File::open(path)?;
    let mut entries = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(serde_json::from_str::<JournalEntry>(&line)?);
    }

    Ok(entries)
}

/// Recompute every hash and link in the journal at `path`.
pub fn verify_journal(path: impl AsRef<Path>) -> Result<JournalSummary> {
    let entries = read_entries(path.as_ref())?;
    let mut head = GENESIS_HASH.to_string();

    for (index, entry) in entries.iter().enumerate() {
        if entry.sequence != index as u64 {
            return Err(OnboardingError::JournalError(format!(
                "Sequence gap at line {}: found {}",
                index, entry.sequence
            )));
        }
        if entry.previous_hash != head {
            return Err(OnboardingError::JournalError(format!(
                "Hash chain broken at entry {}",
                index
            )));
        }
        if !entry.verify_hash() {
            return Err(OnboardingError::JournalError(format!(
                "Invalid hash in entry {}",
                index
            )));
        }
        head = entry.entry_hash.clone();
    }

    Ok(JournalSummary {
        entries: entries.len() as u64,
        head_hash: head,
    })
}
