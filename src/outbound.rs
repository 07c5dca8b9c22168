// =============================================================================
// C8 — Outbound emitter (§4.8).
// =============================================================================
// On acceptance: persist AcceptedMessage, add the local mobile to the
// membership cache, and best-effort forward to the configured cloud
// endpoint. Persistence is authoritative — forward failures and cache
// errors are logged and swallowed, never escalated into the batch loop
// (§9 "Membership cache authority").
// =============================================================================

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use crate::cache::MembershipCache;
use crate::config::CLOUD_FORWARD_TIMEOUT;
use crate::models::EnrichedMessage;

#[derive(Serialize)]
struct ForwardPayload<'a> {
    sender_number: &'a str,
    sms_message: &'a str,
    received_timestamp: chrono::DateTime<Utc>,
}

pub struct OutboundEmitter {
    http_client: reqwest::Client,
    cf_backend_url: Option<String>,
    cf_api_key: Option<String>,
}

impl OutboundEmitter {
    pub fn new(cf_backend_url: Option<String>, cf_api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(CLOUD_FORWARD_TIMEOUT)
            .build()
            .expect("reqwest client builds with a static config");

        Self {
            http_client,
            cf_backend_url,
            cf_api_key,
        }
    }

    /// Persists the accepted message, updates the membership cache, and
    /// kicks off a best-effort cloud forward. Only the persist step can
    /// fail the caller — everything after it is swallowed.
    pub async fn accept(
        &self,
        pool: &PgPool,
        cache: &dyn MembershipCache,
        msg: &EnrichedMessage,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO out_sms (uuid, sender_number, sms_message, local_mobile)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (uuid) DO NOTHING",
        )
        .bind(msg.input.uuid)
        .bind(&msg.input.sender_number)
        .bind(&msg.input.sms_message)
        .bind(&msg.local_mobile)
        .execute(pool)
        .await?;

        if let Err(err) = cache.add(&msg.local_mobile).await {
            tracing::warn!(
                uuid = %msg.input.uuid,
                error = %err,
                "membership_cache_add_failed"
            );
        }

        self.forward(msg).await;
        Ok(())
    }

    async fn forward(&self, msg: &EnrichedMessage) {
        let (Some(url), Some(api_key)) = (&self.cf_backend_url, &self.cf_api_key) else {
            return;
        };

        let payload = ForwardPayload {
            sender_number: &msg.input.sender_number,
            sms_message: &msg.input.sms_message,
            received_timestamp: msg.input.received_timestamp,
        };

        let result = self
            .http_client
            .post(url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                tracing::warn!(
                    uuid = %msg.input.uuid,
                    status = %resp.status(),
                    "cloud_forward_non_success"
                );
            }
            Err(err) => {
                tracing::warn!(uuid = %msg.input.uuid, error = %err, "cloud_forward_failed");
            }
        }
    }
}
