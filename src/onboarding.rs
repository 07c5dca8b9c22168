// =============================================================================
// C5 — Onboarding registry.
// =============================================================================
// Creates/reactivates per-mobile records carrying a salt, a derived hash, a
// request timestamp, and an active flag (§4.5, invariant I5).
// =============================================================================

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{OnboardingRecord, OnboardingStatus};

pub struct OnboardingRegistry<'a> {
    pool: &'a PgPool,
}

/// `hash = SHA-256("ONBOARD" ++ mobile_number ++ salt)`, lowercase hex (I5).
fn derive_hash(mobile_number: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"ONBOARD");
    hasher.update(mobile_number.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cryptographically strong random salt of `length` hex characters.
fn generate_salt(length: usize) -> String {
    let byte_len = length.div_ceil(2);
    let mut bytes = vec![0u8; byte_len];
    let mut rng = rand::rngs::OsRng;
    rng.fill_bytes(&mut bytes);
    let mut hex = hex::encode(bytes);
    hex.truncate(length);
    hex
}

impl<'a> OnboardingRegistry<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Registers a mobile number, returning `(hash, "ONBOARD:<hash>")`.
    /// Reactivates an inactive record with a fresh salt; rejects an active
    /// one with `AppError::OnboardingConflict`.
    pub async fn register(
        &self,
        mobile_number: &str,
        hash_salt_length: usize,
    ) -> AppResult<(String, String)> {
        let existing = self.find(mobile_number).await?;

        if let Some(record) = &existing {
            if record.is_active {
                return Err(AppError::OnboardingConflict);
            }
        }

        let salt = generate_salt(hash_salt_length);
        let hash = derive_hash(mobile_number, &salt);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO onboarding_mobile (mobile_number, salt, hash, request_timestamp, is_active)
             VALUES ($1, $2, $3, $4, true)
             ON CONFLICT (mobile_number)
             DO UPDATE SET salt = EXCLUDED.salt, hash = EXCLUDED.hash,
                           request_timestamp = EXCLUDED.request_timestamp, is_active = true",
        )
        .bind(mobile_number)
        .bind(&salt)
        .bind(&hash)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok((hash.clone(), format!("ONBOARD:{hash}")))
    }

    pub async fn find(&self, mobile_number: &str) -> Result<Option<OnboardingRecord>, sqlx::Error> {
        sqlx::query_as::<_, OnboardingRecord>(
            "SELECT mobile_number, salt, hash, request_timestamp, is_active
             FROM onboarding_mobile WHERE mobile_number = $1",
        )
        .bind(mobile_number)
        .fetch_optional(self.pool)
        .await
    }

    pub async fn find_active(
        &self,
        mobile_number: &str,
    ) -> Result<Option<OnboardingRecord>, sqlx::Error> {
        sqlx::query_as::<_, OnboardingRecord>(
            "SELECT mobile_number, salt, hash, request_timestamp, is_active
             FROM onboarding_mobile WHERE mobile_number = $1 AND is_active = true",
        )
        .bind(mobile_number)
        .fetch_optional(self.pool)
        .await
    }

    pub async fn status(&self, mobile_number: &str) -> AppResult<OnboardingStatus> {
        let record = self
            .find(mobile_number)
            .await?
            .ok_or(AppError::OnboardingNotFound)?;

        let (validated,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM sms_monitor m
                JOIN input_sms i ON i.uuid = m.uuid
                WHERE m.overall_status = 'valid' AND i.sms_message LIKE '%' || $1 || '%'
             )",
        )
        .bind(mobile_number)
        .fetch_one(self.pool)
        .await?;

        Ok(OnboardingStatus {
            mobile_number: record.mobile_number,
            request_timestamp: record.request_timestamp,
            is_active: record.is_active,
            sms_validated: validated,
        })
    }

    pub async fn deactivate(&self, mobile_number: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE onboarding_mobile SET is_active = false WHERE mobile_number = $1",
        )
        .bind(mobile_number)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OnboardingNotFound);
        }
        Ok(())
    }
}
