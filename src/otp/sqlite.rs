use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::debug;

use super::code::CodeGenerator;
use super::store::OtpStore;
use crate::clock::Clock;
use crate::database::models::OtpRecord;
use crate::error::{OnboardingError, Result};

/// OTP store backed by the `otp_codes` table.
///
/// Consumption is one conditional `UPDATE`; the affected-row count decides
/// the verify result, so the check and the transition cannot interleave.
/// Timestamps are whole milliseconds: the issue time is truncated, so the
/// stored expiry is exact, and `now` is rounded up when verifying.
pub struct SqliteOtpStore {
    pool: SqlitePool,
    generator: CodeGenerator,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl SqliteOtpStore {
    pub fn new(
        pool: SqlitePool,
        generator: CodeGenerator,
        ttl: chrono::Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            generator,
            ttl,
            clock,
        }
    }
}

/// Smallest whole millisecond not earlier than `t`.
fn ceil_millis(t: DateTime<Utc>) -> i64 {
    let ms = t.timestamp_millis();
    if t.timestamp_subsec_nanos() % 1_000_000 == 0 {
        ms
    } else {
        ms + 1
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| OnboardingError::DatabaseError(format!("Invalid timestamp: {}", ms)))
}

#[async_trait]
impl OtpStore for SqliteOtpStore {
    async fn issue(&self, email: &str) -> Result<String> {
        let issued_at_ms = self.clock.now().trunc_subsecs(3).timestamp_millis();
        let expires_at_ms = issued_at_ms + self.ttl.num_milliseconds();
        let code = self.generator.generate();

        sqlx::query(
            r#"
            INSERT INTO otp_codes (email, code, issued_at_ms, expires_at_ms, consumed)
            VALUES (?, ?, ?, ?, 0)
            ON CONFLICT (email) DO UPDATE SET
                code = excluded.code,
                issued_at_ms = excluded.issued_at_ms,
                expires_at_ms = excluded.expires_at_ms,
                consumed = 0
            "#,
        )
        .bind(email)
        .bind(&code)
        .bind(issued_at_ms)
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| OnboardingError::DatabaseError(format!("Failed to store OTP: {}", e)))?;

        debug!(email, "Issued OTP");
        Ok(code)
    }

    async fn verify(&self, email: &str, code: &str) -> Result<bool> {
        let now_ms = ceil_millis(self.clock.now());

        let result = sqlx::query(
            r#"
            UPDATE otp_codes
            SET consumed = 1
            WHERE email = ? AND code = ? AND consumed = 0 AND expires_at_ms >= ?
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| OnboardingError::DatabaseError(format!("Failed to verify OTP: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn lookup(&self, email: &str) -> Result<Option<OtpRecord>> {
        let row = sqlx::query(
            r#"
            SELECT email, code, issued_at_ms, expires_at_ms, consumed
            FROM otp_codes
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OnboardingError::DatabaseError(format!("Failed to fetch OTP: {}", e)))?;

        row.map(|row| {
            Ok(OtpRecord {
                email: row.get::<String, _>("email"),
                code: row.get::<String, _>("code"),
                issued_at: from_millis(row.get::<i64, _>("issued_at_ms"))?,
                expires_at: from_millis(row.get::<i64, _>("expires_at_ms"))?,
                consumed: row.get::<i64, _>("consumed") != 0,
            })
        })
        .transpose()
    }
}
