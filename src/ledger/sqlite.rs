use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::info;

use super::{LedgerWrite, RegistrationLedger};
use crate::database::models::RegistrationLedgerEntry;
use crate::error::{OnboardingError, Result};

pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RegistrationLedgerEntry> {
        let recorded_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("recorded_at"))
            .map_err(|e| OnboardingError::DatabaseError(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(RegistrationLedgerEntry {
            email: row.get::<String, _>("email"),
            address: row.get::<String, _>("address"),
            recorded_at,
        })
    }
}

#[async_trait]
impl RegistrationLedger for SqliteLedger {
    async fn record(&self, email: &str, address: &str) -> Result<LedgerWrite> {
        let result = sqlx::query(
            r#"
            INSERT INTO registrations (email, address, recorded_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(address)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(email, address, "Recorded registration");
                Ok(LedgerWrite::Recorded)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(LedgerWrite::AlreadyRegistered)
            }
            Err(e) => Err(OnboardingError::DatabaseError(format!(
                "Failed to record registration: {}",
                e
            ))),
        }
    }

    async fn lookup(&self, email: &str) -> Result<Option<RegistrationLedgerEntry>> {
        let row = sqlx::query(
            r#"
            SELECT email, address, recorded_at
            FROM registrations
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OnboardingError::DatabaseError(format!("Failed to fetch registration: {}", e)))?;

        row.as_ref().map(Self::entry_from_row).transpose()
    }

    async fn list(&self, limit: i64) -> Result<Vec<RegistrationLedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT email, address, recorded_at
            FROM registrations
            ORDER BY recorded_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OnboardingError::DatabaseError(format!("Failed to list registrations: {}", e)))?;

        rows.iter().map(Self::entry_from_row).collect()
    }
}
