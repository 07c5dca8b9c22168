// Integration tests for individual checks that need a real store (§8
// boundary behaviors not already covered by pure unit tests).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use sms_validation_bridge::cache::MembershipCache;
use sms_validation_bridge::checks::{dispatch, CheckContext, CheckOutcome};
use sms_validation_bridge::models::{CheckName, EnrichedMessage, InputMessage};
use sms_validation_bridge::settings::SettingsSnapshot;

struct NoopCache;

#[async_trait]
impl MembershipCache for NoopCache {
    async fn contains(&self, _local_number: &str) -> Result<bool, redis::RedisError> {
        Ok(false)
    }

    async fn add(&self, _local_number: &str) -> Result<(), redis::RedisError> {
        Ok(())
    }
}

fn snapshot(blacklist_threshold: i64) -> SettingsSnapshot {
    SettingsSnapshot {
        check_sequence: vec![],
        check_enabled: HashMap::new(),
        batch_size: 100,
        last_processed_uuid: None,
        validation_time_window: 300,
        blacklist_threshold,
        allowed_country_codes: vec!["91".to_string()],
        foreign_number_validation: true,
        permitted_headers: vec!["ONBOARD".to_string()],
        hash_salt_length: 32,
    }
}

fn message(sender_number: &str) -> EnrichedMessage {
    EnrichedMessage {
        input: InputMessage {
            uuid: Uuid::now_v7(),
            sender_number: sender_number.to_string(),
            sms_message: "irrelevant".to_string(),
            received_timestamp: Utc::now(),
        },
        country_code: "91".to_string(),
        local_mobile: "9912345678".to_string(),
    }
}

/// S5 — threshold=3: the 1st-3rd messages from a sender PASS, the 4th
/// FAILs and a BlacklistRecord appears, the 5th still FAILs.
#[sqlx::test]
async fn blacklist_trips_after_threshold_and_stays_tripped(pool: PgPool) {
    let settings = snapshot(3);
    let cache = NoopCache;
    let ctx = CheckContext {
        pool: &pool,
        cache: &cache,
        settings: &settings,
    };

    for attempt in 1..=3 {
        let msg = message("+919912345678");
        let outcome = dispatch(CheckName::Blacklist, &msg, &ctx).await;
        assert_eq!(outcome, CheckOutcome::Pass, "attempt {attempt} should pass");
    }

    let fourth = message("+919912345678");
    let outcome = dispatch(CheckName::Blacklist, &fourth, &ctx).await;
    assert_eq!(outcome, CheckOutcome::Fail);

    let row: (String,) = sqlx::query_as("SELECT sender_number FROM blacklist_sms WHERE sender_number = $1")
        .bind(&fourth.input.sender_number)
        .fetch_one(&pool)
        .await
        .expect("blacklist row present after trip");
    assert_eq!(row.0, fourth.input.sender_number);

    let fifth = message("+919912345678");
    let outcome = dispatch(CheckName::Blacklist, &fifth, &ctx).await;
    assert_eq!(outcome, CheckOutcome::Fail, "count keeps incrementing past the trip point");
}
