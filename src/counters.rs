// =============================================================================
// C4 — Counter & blacklist store.
// =============================================================================
// Per-sender message counter with atomic increment-and-return, plus the
// auxiliary blacklist set it feeds (§4.4). Used only by the `blacklist`
// check; both operations are row-transactional and idempotent where the
// spec requires it (I3, I4).
// =============================================================================

use sqlx::PgPool;

pub struct CounterStore<'a> {
    pool: &'a PgPool,
}

impl<'a> CounterStore<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Atomic upsert returning the post-increment count (1 on first sight).
    pub async fn increment_and_fetch(
        &self,
        sender_number: &str,
        country_code: &str,
        local_mobile: &str,
    ) -> Result<i32, sqlx::Error> {
        let (count,): (i32,) = sqlx::query_as(
            "INSERT INTO count_sms (sender_number, message_count, country_code, local_mobile)
             VALUES ($1, 1, $2, $3)
             ON CONFLICT (sender_number)
             DO UPDATE SET message_count = count_sms.message_count + 1
             RETURNING message_count",
        )
        .bind(sender_number)
        .bind(country_code)
        .bind(local_mobile)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Idempotent insert — repeat trips for the same sender are no-ops.
    pub async fn add_blacklist(
        &self,
        sender_number: &str,
        country_code: &str,
        local_mobile: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO blacklist_sms (sender_number, country_code, local_mobile)
             VALUES ($1, $2, $3)
             ON CONFLICT (sender_number) DO NOTHING",
        )
        .bind(sender_number)
        .bind(country_code)
        .bind(local_mobile)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn is_blacklisted(&self, sender_number: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM blacklist_sms WHERE sender_number = $1")
                .bind(sender_number)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.is_some())
    }
}
