use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A one-time code bound to an email.
///
/// At most one record exists per email; reissuing overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub email: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationLedgerEntry {
    pub email: String,
    pub address: String,
    pub recorded_at: DateTime<Utc>,
}
