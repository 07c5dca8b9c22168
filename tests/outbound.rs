// Integration test for the cloud-forward path (C8), using a real migrated
// Postgres (`#[sqlx::test]`) and a `wiremock` mock server standing in for
// the cloud backend.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sms_validation_bridge::cache::MembershipCache;
use sms_validation_bridge::models::{EnrichedMessage, InputMessage};
use sms_validation_bridge::outbound::OutboundEmitter;

#[derive(Default)]
struct InMemoryCache {
    members: Mutex<HashSet<String>>,
}

#[async_trait]
impl MembershipCache for InMemoryCache {
    async fn contains(&self, local_number: &str) -> Result<bool, redis::RedisError> {
        Ok(self.members.lock().await.contains(local_number))
    }

    async fn add(&self, local_number: &str) -> Result<(), redis::RedisError> {
        self.members.lock().await.insert(local_number.to_string());
        Ok(())
    }
}

fn enriched(uuid: Uuid, sender_number: &str, sms_message: &str, local_mobile: &str) -> EnrichedMessage {
    EnrichedMessage {
        input: InputMessage {
            uuid,
            sender_number: sender_number.to_string(),
            sms_message: sms_message.to_string(),
            received_timestamp: Utc::now(),
        },
        country_code: "91".to_string(),
        local_mobile: local_mobile.to_string(),
    }
}

/// `accept` persists first, then forwards best-effort to the configured
/// cloud endpoint with bearer auth and the expected JSON body (§4.8).
#[sqlx::test]
async fn accept_persists_and_forwards_to_cloud_backend(pool: PgPool) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ingest"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let emitter = OutboundEmitter::new(
        Some(format!("{}/ingest", mock_server.uri())),
        Some("test-api-key".to_string()),
    );
    let cache = InMemoryCache::default();
    let msg = enriched(Uuid::now_v7(), "+919912345678", "ONBOARD:deadbeef", "9912345678");

    emitter.accept(&pool, &cache, &msg).await.expect("accept");

    assert!(cache.contains("9912345678").await.unwrap());

    let row: Option<(Uuid,)> = sqlx::query_as("SELECT uuid FROM out_sms WHERE uuid = $1")
        .bind(msg.input.uuid)
        .fetch_optional(&pool)
        .await
        .expect("query out_sms");
    assert!(row.is_some());

    mock_server.verify().await;
}

/// A non-success response from the cloud backend is logged and swallowed;
/// acceptance has already been persisted and must not roll back.
#[sqlx::test]
async fn accept_survives_a_failing_cloud_backend(pool: PgPool) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ingest"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let emitter = OutboundEmitter::new(
        Some(format!("{}/ingest", mock_server.uri())),
        Some("test-api-key".to_string()),
    );
    let cache = InMemoryCache::default();
    let msg = enriched(Uuid::now_v7(), "+919912345679", "ONBOARD:deadbeef", "9912345679");

    emitter.accept(&pool, &cache, &msg).await.expect("accept still succeeds");

    let row: Option<(Uuid,)> = sqlx::query_as("SELECT uuid FROM out_sms WHERE uuid = $1")
        .bind(msg.input.uuid)
        .fetch_optional(&pool)
        .await
        .expect("query out_sms");
    assert!(row.is_some());
}

/// With no cloud backend configured, `accept` persists and skips forwarding
/// entirely — no mock expectation means any stray request would fail here.
#[sqlx::test]
async fn accept_without_cloud_backend_configured_skips_forward(pool: PgPool) {
    let emitter = OutboundEmitter::new(None, None);
    let cache = InMemoryCache::default();
    let msg = enriched(Uuid::now_v7(), "+919912345680", "ONBOARD:deadbeef", "9912345680");

    emitter.accept(&pool, &cache, &msg).await.expect("accept");

    let row: Option<(Uuid,)> = sqlx::query_as("SELECT uuid FROM out_sms WHERE uuid = $1")
        .bind(msg.input.uuid)
        .fetch_optional(&pool)
        .await
        .expect("query out_sms");
    assert!(row.is_some());
}
