// =============================================================================
// C1 — Settings store accessor.
// =============================================================================
// Typed reads of the `system_settings` key/value table. The stored text is
// attempted as JSON first; if that fails it is handed back as the raw
// string. Settings are polled every batch cycle (§4.1) — no caching layer
// beyond the pool itself.
// =============================================================================

use serde_json::Value;
use sqlx::PgPool;

use crate::models::CheckName;

pub struct SettingsStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Raw typed read: JSON-decode the stored text, falling back to the
    /// literal string if it isn't valid JSON.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT setting_value FROM system_settings WHERE setting_key = $1")
                .bind(key)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|(v,)| serde_json::from_str(&v).unwrap_or(Value::String(v))))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO system_settings (setting_key, setting_value) VALUES ($1, $2)
             ON CONFLICT (setting_key) DO UPDATE SET setting_value = EXCLUDED.setting_value",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> Result<SettingsSnapshot, sqlx::Error> {
        let check_sequence = self
            .get("check_sequence")
            .await?
            .and_then(|v| v.as_array().cloned())
            .map(|arr| {
                arr.into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_else(|| {
                CheckName::ALL
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect()
            });

        let check_enabled = self
            .get("check_enabled")
            .await?
            .and_then(|v| v.as_object().cloned())
            .map(|obj| {
                obj.into_iter()
                    .map(|(k, v)| (k, v.as_bool().unwrap_or(true)))
                    .collect::<std::collections::HashMap<_, _>>()
            })
            .unwrap_or_default();

        let batch_size = self
            .get("batch_size")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(100) as u32;

        let last_processed_uuid = self
            .get("last_processed_uuid")
            .await?
            .and_then(|v| v.as_str().map(str::to_string));

        let validation_time_window = self
            .get("validation_time_window")
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(300);

        let blacklist_threshold = self
            .get("blacklist_threshold")
            .await?
            .and_then(|v| v.as_i64())
            .unwrap_or(10);

        let allowed_country_codes = self
            .get("allowed_country_codes")
            .await?
            .and_then(|v| v.as_array().cloned())
            .map(|arr| {
                let mut codes: Vec<String> = arr
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                codes.sort_by_key(|c| std::cmp::Reverse(c.len()));
                codes
            })
            .unwrap_or_else(|| vec!["91".to_string()]);

        let foreign_number_validation = self
            .get("foreign_number_validation")
            .await?
            .map(|v| match v {
                Value::Bool(b) => b,
                Value::String(s) => s == "true",
                _ => false,
            })
            .unwrap_or(false);

        let permitted_headers = self
            .get("permitted_headers")
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .map(|s| s.split(',').map(|h| h.trim().to_string()).collect())
            .unwrap_or_else(|| vec!["ONBOARD".to_string()]);

        let hash_salt_length = self
            .get("hash_salt_length")
            .await?
            .and_then(|v| v.as_u64())
            .unwrap_or(32) as usize;

        Ok(SettingsSnapshot {
            check_sequence,
            check_enabled,
            batch_size,
            last_processed_uuid,
            validation_time_window,
            blacklist_threshold,
            allowed_country_codes,
            foreign_number_validation,
            permitted_headers,
            hash_salt_length,
        })
    }

    pub async fn advance_cursor(&self, uuid: &uuid::Uuid) -> Result<(), sqlx::Error> {
        self.set("last_processed_uuid", &uuid.to_string()).await
    }
}

/// One immutable view of settings assembled at the start of a batch cycle
/// (§4.1), so the rest of the engine doesn't re-query settings mid-cycle.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub check_sequence: Vec<String>,
    pub check_enabled: std::collections::HashMap<String, bool>,
    pub batch_size: u32,
    pub last_processed_uuid: Option<String>,
    pub validation_time_window: i64,
    pub blacklist_threshold: i64,
    /// Sorted longest-prefix-first, per §4.2 step 2.
    pub allowed_country_codes: Vec<String>,
    pub foreign_number_validation: bool,
    pub permitted_headers: Vec<String>,
    pub hash_salt_length: usize,
}

impl SettingsSnapshot {
    pub fn is_enabled(&self, check: CheckName) -> bool {
        self.check_enabled.get(check.as_str()).copied().unwrap_or(true)
    }
}
