// =============================================================================
// C3 — Membership cache.
// =============================================================================
// A process-external set of local mobile numbers belonging to accepted
// messages, keyed by the string `out_sms_numbers` (§4.3). Backed by Redis
// `SISMEMBER`/`SADD`, following the connection-manager idiom used for the
// Redis cache store elsewhere in this codebase's lineage.
// =============================================================================

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const MEMBERSHIP_SET_KEY: &str = "out_sms_numbers";

#[async_trait]
pub trait MembershipCache: Send + Sync {
    async fn contains(&self, local_number: &str) -> Result<bool, redis::RedisError>;
    async fn add(&self, local_number: &str) -> Result<(), redis::RedisError>;
}

#[derive(Clone)]
pub struct RedisMembershipCache {
    connection: ConnectionManager,
}

impl RedisMembershipCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    /// Warm-starts the set from every already-accepted local mobile number,
    /// so the cache is authoritative for the duplicate check immediately
    /// after a restart without waiting on new traffic (§3 AcceptedNumberSet).
    pub async fn warm_start(&self, pool: &sqlx::PgPool) -> Result<usize, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT local_mobile FROM out_sms")
                .fetch_all(pool)
                .await?;
        let mut conn = self.connection.clone();
        for (local,) in &rows {
            let _: Result<(), _> = conn.sadd(MEMBERSHIP_SET_KEY, local).await;
        }
        Ok(rows.len())
    }
}

#[async_trait]
impl MembershipCache for RedisMembershipCache {
    async fn contains(&self, local_number: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.connection.clone();
        conn.sismember(MEMBERSHIP_SET_KEY, local_number).await
    }

    async fn add(&self, local_number: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.connection.clone();
        let _: () = conn.sadd(MEMBERSHIP_SET_KEY, local_number).await?;
        Ok(())
    }
}

/// In-process stand-in used by unit tests so checks can be exercised without
/// a live Redis (§8 boundary tables, round-trip tests).
#[cfg(test)]
pub mod test_support {
    use super::MembershipCache;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryMembershipCache {
        members: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl MembershipCache for InMemoryMembershipCache {
        async fn contains(&self, local_number: &str) -> Result<bool, redis::RedisError> {
            Ok(self.members.lock().await.contains(local_number))
        }

        async fn add(&self, local_number: &str) -> Result<(), redis::RedisError> {
            self.members.lock().await.insert(local_number.to_string());
            Ok(())
        }
    }
}
