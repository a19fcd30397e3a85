use async_trait::async_trait;
use chrono::SubsecRound;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::code::{codes_match, CodeGenerator};
use crate::clock::Clock;
use crate::database::models::OtpRecord;
use crate::error::Result;

/// Keyed store of one-time codes.
///
/// `verify` fails closed: a missing, mismatched, expired or already consumed
/// record yields `Ok(false)`. `Err` is reserved for storage failures. A
/// successful verify consumes the record atomically, so concurrent callers
/// with the same code see exactly one `true`.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Generate and store a fresh code for `email`, replacing any previous one.
    async fn issue(&self, email: &str) -> Result<String>;

    async fn verify(&self, email: &str, code: &str) -> Result<bool>;

    async fn lookup(&self, email: &str) -> Result<Option<OtpRecord>>;
}

/// In-process store; the consume transition happens under a single lock.
pub struct MemoryOtpStore {
    records: Mutex<HashMap<String, OtpRecord>>,
    generator: CodeGenerator,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl MemoryOtpStore {
    pub fn new(generator: CodeGenerator, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            generator,
            ttl,
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn issue(&self, email: &str) -> Result<String> {
        // Same millisecond resolution as the SQLite store.
        let now = self.clock.now().trunc_subsecs(3);
        let code = self.generator.generate();
        let record = OtpRecord {
            email: email.to_string(),
            code: code.clone(),
            issued_at: now,
            expires_at: now + self.ttl,
            consumed: false,
        };

        self.records.lock().await.insert(email.to_string(), record);
        debug!(email, "Issued OTP");
        Ok(code)
    }

    async fn verify(&self, email: &str, code: &str) -> Result<bool> {
        let now = self.clock.now();
        let mut records = self.records.lock().await;

        let Some(record) = records.get_mut(email) else {
            return Ok(false);
        };
        if !record.is_usable(now) || !codes_match(&record.code, code) {
            return Ok(false);
        }

        record.consumed = true;
        Ok(true)
    }

    async fn lookup(&self, email: &str) -> Result<Option<OtpRecord>> {
        Ok(self.records.lock().await.get(email).cloned())
    }
}
